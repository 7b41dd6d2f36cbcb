use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;

use malgate::models::video::VideoRecord;
use malgate::store::{StorageError, SupabaseStore, VideoStore};

/// Minimal stand-in for the Supabase PostgREST endpoint: records the query
/// parameters it was called with and keeps inserted rows in memory.
#[derive(Clone, Default)]
struct PostgrestState {
    rows: Arc<Mutex<Vec<serde_json::Value>>>,
    last_query: Arc<Mutex<Option<HashMap<String, String>>>>,
}

async fn postgrest_list(
    State(state): State<PostgrestState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> axum::response::Response {
    *state.last_query.lock().unwrap() = Some(params);

    if headers.get("apikey").is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "No API key found in request" })),
        )
            .into_response();
    }

    Json(state.rows.lock().unwrap().clone()).into_response()
}

async fn postgrest_insert(
    State(state): State<PostgrestState>,
    Json(row): Json<serde_json::Value>,
) -> Json<Vec<serde_json::Value>> {
    state.rows.lock().unwrap().push(row.clone());
    Json(vec![row])
}

async fn spawn_postgrest(state: PostgrestState) -> String {
    let app = Router::new()
        .route("/rest/v1/videos", get(postgrest_list))
        .route("/rest/v1/videos", post(postgrest_insert))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    base_url
}

fn record(anime_id: &str, episode: i32) -> VideoRecord {
    VideoRecord {
        id: format!("{anime_id}-{episode}-0"),
        anime_id: anime_id.to_string(),
        episode,
        title: format!("Episode {episode}"),
        embed_url: format!("https://example.com/embed/{episode}"),
        download_url: None,
        quality: None,
        uploaded_at: Utc::now(),
    }
}

#[tokio::test]
async fn insert_returns_stored_row() {
    let state = PostgrestState::default();
    let base_url = spawn_postgrest(state.clone()).await;
    let store = SupabaseStore::new(&base_url, "service-key", reqwest::Client::new());

    let stored = store.insert(record("42", 1)).await.unwrap();

    assert_eq!(stored.anime_id, "42");
    assert_eq!(stored.episode, 1);

    // The row reached the table with camelCase column names.
    let rows = state.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["animeId"], "42");
    assert!(rows[0].get("embedUrl").is_some());
}

#[tokio::test]
async fn list_by_anime_pushes_filter_and_order_down() {
    let state = PostgrestState::default();
    let base_url = spawn_postgrest(state.clone()).await;
    let store = SupabaseStore::new(&base_url, "service-key", reqwest::Client::new());

    store.list_by_anime("42").await.unwrap();

    let query = state.last_query.lock().unwrap().clone().unwrap();
    assert_eq!(query.get("select").map(String::as_str), Some("*"));
    assert_eq!(query.get("animeId").map(String::as_str), Some("eq.42"));
    assert_eq!(query.get("order").map(String::as_str), Some("episode.asc"));
}

#[tokio::test]
async fn list_orders_newest_upload_first() {
    let state = PostgrestState::default();
    let base_url = spawn_postgrest(state.clone()).await;
    let store = SupabaseStore::new(&base_url, "service-key", reqwest::Client::new());

    store.list().await.unwrap();

    let query = state.last_query.lock().unwrap().clone().unwrap();
    assert_eq!(
        query.get("order").map(String::as_str),
        Some("uploadedAt.desc")
    );
}

#[tokio::test]
async fn remote_failure_propagates_status_and_body() {
    // No rows route here: every request hits the failure handler.
    let app = Router::new().route(
        "/rest/v1/videos",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "connection to database failed" })),
            )
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let store = SupabaseStore::new(&base_url, "service-key", reqwest::Client::new());

    match store.list().await {
        Err(StorageError::Remote { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("connection to database failed"));
        }
        other => panic!("expected remote storage error, got {other:?}"),
    }
}
