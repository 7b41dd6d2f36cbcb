use axum::{
    Json,
    extract::{Query, State},
};
use std::collections::HashMap;
use std::sync::Arc;

use super::ApiError;
use crate::state::AppState;

/// Upstream path prefixes the proxy endpoint may forward. Anything else is
/// rejected before the upstream client is consulted.
const ALLOWED_PREFIXES: &[&str] = &["anime", "users", "producers", "studios"];

/// Checks the first path segment against the allow-list. Empty and missing
/// segments are rejected.
#[must_use]
pub fn is_allowed_path(path: &str) -> bool {
    path.split('/')
        .next()
        .is_some_and(|prefix| !prefix.is_empty() && ALLOWED_PREFIXES.contains(&prefix))
}

/// Generic passthrough to any allow-listed MAL v2 resource. Every query
/// parameter except `path` is forwarded verbatim.
pub async fn proxy_upstream(
    State(state): State<Arc<AppState>>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(path) = params.remove("path") else {
        return Err(ApiError::validation("missing path query param"));
    };

    if !is_allowed_path(&path) {
        return Err(ApiError::forbidden("path not allowed"));
    }

    let data = state.mal.request(&path, &params).await?;
    Ok(Json(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_listed_prefixes() {
        assert!(is_allowed_path("anime"));
        assert!(is_allowed_path("anime/ranking"));
        assert!(is_allowed_path("anime/season/2024/spring"));
        assert!(is_allowed_path("users/me/animelist"));
        assert!(is_allowed_path("producers"));
        assert!(is_allowed_path("studios/43"));
    }

    #[test]
    fn rejects_unlisted_prefixes() {
        assert!(!is_allowed_path("forum/boards"));
        assert!(!is_allowed_path("manga/1"));
        // Prefix match is on the whole first segment, not a substring.
        assert!(!is_allowed_path("animelist"));
    }

    #[test]
    fn rejects_empty_paths() {
        assert!(!is_allowed_path(""));
        assert!(!is_allowed_path("/anime"));
    }
}
