use async_trait::async_trait;
use reqwest::Client;

use super::{StorageError, VideoStore};
use crate::models::video::VideoRecord;

/// Remote table backend speaking the Supabase PostgREST API.
///
/// Each record is a row in the `videos` table; filtering and ordering are
/// pushed down to the server via PostgREST query parameters.
pub struct SupabaseStore {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(url: &str, api_key: &str, http: Client) -> Self {
        Self {
            http,
            endpoint: format!("{}/rest/v1/videos", url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    async fn fetch(&self, query: &[(&str, String)]) -> Result<Vec<VideoRecord>, StorageError> {
        let response = self
            .http
            .get(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Remote { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl VideoStore for SupabaseStore {
    async fn list(&self) -> Result<Vec<VideoRecord>, StorageError> {
        self.fetch(&[
            ("select", "*".to_string()),
            ("order", "uploadedAt.desc".to_string()),
        ])
        .await
    }

    async fn list_by_anime(&self, anime_id: &str) -> Result<Vec<VideoRecord>, StorageError> {
        self.fetch(&[
            ("select", "*".to_string()),
            ("animeId", format!("eq.{anime_id}")),
            ("order", "episode.asc".to_string()),
        ])
        .await
    }

    async fn insert(&self, record: VideoRecord) -> Result<VideoRecord, StorageError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Remote { status, body });
        }

        // PostgREST returns the inserted rows as an array.
        let mut rows: Vec<VideoRecord> = response.json().await?;
        Ok(rows.pop().unwrap_or(record))
    }
}
