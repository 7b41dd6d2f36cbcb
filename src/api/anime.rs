use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::ApiError;
use crate::state::AppState;

/// Field sets requested from MAL when the client does not pick its own.
const SEARCH_FIELDS: &str =
    "id,title,main_picture,mean,genres,episodes,media_type,status,start_date,studios,synopsis";
const DETAIL_FIELDS: &str = "id,title,main_picture,mean,genres,episodes,media_type,status,start_date,studios,synopsis,background";

const DEFAULT_SEARCH_LIMIT: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub fields: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailParams {
    #[serde(default)]
    pub fields: Option<String>,
}

/// Keyword search against the MAL `anime` resource. The upstream response
/// is returned verbatim.
pub async fn search_anime(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let q = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::validation("missing q parameter"))?;

    let mut query = HashMap::new();
    query.insert("q".to_string(), q.to_string());
    query.insert(
        "limit".to_string(),
        params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).to_string(),
    );
    query.insert(
        "fields".to_string(),
        params.fields.unwrap_or_else(|| SEARCH_FIELDS.to_string()),
    );

    let data = state.mal.request("anime", &query).await?;
    Ok(Json(data))
}

/// Single-item lookup by MAL id.
pub async fn get_anime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DetailParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut query = HashMap::new();
    query.insert(
        "fields".to_string(),
        params.fields.unwrap_or_else(|| DETAIL_FIELDS.to_string()),
    );

    let data = state.mal.request(&format!("anime/{id}"), &query).await?;
    Ok(Json(data))
}
