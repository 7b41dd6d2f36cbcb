use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ApiError;
use crate::models::video::VideoRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadVideoRequest {
    #[serde(default)]
    pub anime_id: Option<String>,

    /// Accepted as a JSON number or a numeric string; see [`coerce_episode`].
    #[serde(default)]
    pub episode: Option<serde_json::Value>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub embed_url: Option<String>,

    #[serde(default)]
    pub download_url: Option<String>,

    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminTokenQuery {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVideosQuery {
    #[serde(default)]
    pub anime_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadVideoResponse {
    pub ok: bool,
    pub item: VideoRecord,
}

/// Coerces `episode` from a JSON number or numeric string. Absent,
/// non-numeric and sub-1 values fall back to episode 1.
fn coerce_episode(value: Option<&serde_json::Value>) -> i32 {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    parsed
        .and_then(|n| i32::try_from(n).ok())
        .filter(|n| *n >= 1)
        .unwrap_or(1)
}

/// The admin secret may arrive as an `x-admin-token` header or a `token`
/// query parameter.
fn check_admin_token(
    state: &AppState,
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<(), ApiError> {
    let presented = headers
        .get("x-admin-token")
        .and_then(|value| value.to_str().ok())
        .or(query_token);

    match presented {
        Some(token) if token == state.config.admin.token => Ok(()),
        _ => Err(ApiError::forbidden("unauthorized")),
    }
}

/// Admin-only episode metadata upload. The record id is generated here;
/// clients never supply one.
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminTokenQuery>,
    Json(payload): Json<UploadVideoRequest>,
) -> Result<Json<UploadVideoResponse>, ApiError> {
    check_admin_token(&state, &headers, query.token.as_deref())?;

    let title = payload
        .title
        .filter(|title| !title.is_empty())
        .ok_or_else(|| ApiError::validation("missing fields (title, embedUrl required)"))?;
    let embed_url = payload
        .embed_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::validation("missing fields (title, embedUrl required)"))?;

    let uploaded_at = Utc::now();
    let millis = uploaded_at.timestamp_millis();

    let anime_id = payload
        .anime_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("local-{millis}"));
    let episode = coerce_episode(payload.episode.as_ref());

    let record = VideoRecord {
        id: format!("{anime_id}-{episode}-{millis}"),
        anime_id,
        episode,
        title,
        embed_url,
        download_url: payload.download_url,
        quality: payload.quality,
        uploaded_at,
    };

    let item = state.store.insert(record).await?;
    Ok(Json(UploadVideoResponse { ok: true, item }))
}

/// Lists all records, or only one anime's when `animeId` is given.
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListVideosQuery>,
) -> Result<Json<Vec<VideoRecord>>, ApiError> {
    let videos = match query.anime_id.as_deref() {
        Some(anime_id) => state.store.list_by_anime(anime_id).await?,
        None => state.store.list().await?,
    };
    Ok(Json(videos))
}

/// Episodes for one anime, ascending by episode number.
pub async fn videos_by_anime(
    State(state): State<Arc<AppState>>,
    Path(anime_id): Path<String>,
) -> Result<Json<Vec<VideoRecord>>, ApiError> {
    Ok(Json(state.store.list_by_anime(&anime_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_episode_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_episode(Some(&json!(7))), 7);
        assert_eq!(coerce_episode(Some(&json!("12"))), 12);
        assert_eq!(coerce_episode(Some(&json!(" 3 "))), 3);
    }

    #[test]
    fn coerce_episode_falls_back_to_one() {
        assert_eq!(coerce_episode(None), 1);
        assert_eq!(coerce_episode(Some(&json!("finale"))), 1);
        assert_eq!(coerce_episode(Some(&json!(null))), 1);
        assert_eq!(coerce_episode(Some(&json!(0))), 1);
        assert_eq!(coerce_episode(Some(&json!(-4))), 1);
    }
}
