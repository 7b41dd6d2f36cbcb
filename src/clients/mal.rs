//! MyAnimeList v2 API client with a process-local OAuth token cache.
//!
//! The gateway never exposes the client id/secret to browsers; every
//! upstream call goes through [`MalClient::request`], which obtains a
//! bearer token from [`TokenCache`] and returns the upstream JSON body
//! untouched.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;

/// Subtracted from the issued TTL so a cached token is never served right
/// at its expiry boundary.
const EXPIRY_SAFETY_MARGIN_SECS: i64 = 30;

/// TTL assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_TTL_SECS: i64 = 1800;

#[derive(Debug, Error)]
pub enum MalError {
    #[error("token exchange failed with status {status}")]
    Auth { status: u16, body: String },

    #[error("upstream request failed with status {status}")]
    Upstream { status: u16, body: String },

    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Caches one client-credentials token, refreshing on expiry.
///
/// The slot lives for the process lifetime. Concurrent cache misses are
/// coalesced behind the write lock: the first caller performs the exchange
/// while the rest wait, then reuse the refreshed credential on re-check.
pub struct TokenCache {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(config: &UpstreamConfig, http: Client) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            slot: RwLock::new(None),
        }
    }

    /// Returns a valid access token, exchanging credentials when the cached
    /// one is missing or expired.
    pub async fn token(&self) -> Result<String, MalError> {
        {
            let slot = self.slot.read().await;
            if let Some(cached) = slot.as_ref()
                && !cached.is_expired()
            {
                return Ok(cached.access_token.clone());
            }
        }

        let mut slot = self.slot.write().await;
        // A concurrent caller may have refreshed while we waited for the lock.
        if let Some(cached) = slot.as_ref()
            && !cached.is_expired()
        {
            return Ok(cached.access_token.clone());
        }

        let fresh = self.exchange().await?;
        let access_token = fresh.access_token.clone();
        *slot = Some(fresh);
        debug!("cached new MAL access token");
        Ok(access_token)
    }

    async fn exchange(&self) -> Result<CachedToken, MalError> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("MAL token exchange failed: {} - {}", status, body);
            return Err(MalError::Auth { status, body });
        }

        let token: TokenResponse = response.json().await?;
        let ttl = token.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECS) - EXPIRY_SAFETY_MARGIN_SECS;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(ttl.max(0)),
        })
    }
}

/// Authenticated, schema-agnostic client for the MAL v2 API.
pub struct MalClient {
    http: Client,
    api_base: String,
    tokens: TokenCache,
}

impl MalClient {
    pub fn new(config: &UpstreamConfig, http: Client) -> Self {
        Self {
            tokens: TokenCache::new(config, http.clone()),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Issues a GET against `{api_base}/{resource_path}` and returns the
    /// parsed JSON body unmodified. Catalog semantics are the caller's
    /// problem; this client does not interpret the payload.
    pub async fn request(
        &self,
        resource_path: &str,
        query: &HashMap<String, String>,
    ) -> Result<serde_json::Value, MalError> {
        let token = self.tokens.token().await?;
        let url = format!("{}/{}", self.api_base, resource_path);

        let response = self
            .http
            .get(&url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MalError::Upstream { status, body });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_expires_at_boundary() {
        let expired = CachedToken {
            access_token: "old".to_string(),
            expires_at: Utc::now() - Duration::seconds(1),
        };
        assert!(expired.is_expired());

        let live = CachedToken {
            access_token: "fresh".to_string(),
            expires_at: Utc::now() + Duration::seconds(60),
        };
        assert!(!live.is_expired());
    }

    #[test]
    fn mal_error_display() {
        let err = MalError::Auth {
            status: 401,
            body: "invalid_client".to_string(),
        };
        assert_eq!(err.to_string(), "token exchange failed with status 401");

        let err = MalError::Upstream {
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "upstream request failed with status 404");
    }
}
