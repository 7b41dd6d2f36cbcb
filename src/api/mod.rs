//! HTTP surface of the gateway.
//!
//! Handlers compose the upstream client and the video store; they never
//! touch the token slot or storage internals directly. Every error is
//! caught at the route boundary and serialized as `{"error": ...}`.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod anime;
mod error;
mod proxy;
mod system;
mod videos;

pub use error::ApiError;

pub fn router(state: Arc<AppState>) -> Router {
    // The browser frontend is served from another origin, so CORS stays
    // permissive.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/anime/search", get(anime::search_anime))
        .route("/api/anime/{id}", get(anime::get_anime))
        .route("/api/proxy", get(proxy::proxy_upstream))
        .route("/api/health", get(system::health))
        .route("/api/admin/video", post(videos::upload_video))
        .route("/api/videos", get(videos::list_videos))
        .route("/api/videos/{anime_id}", get(videos::videos_by_anime))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
