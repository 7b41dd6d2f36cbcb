//! Video metadata persistence.
//!
//! Two interchangeable backends sit behind [`VideoStore`]: a local JSON
//! document ([`FileStore`]) and a remote Supabase table ([`SupabaseStore`]).
//! The backend is picked once at startup from configuration and stays fixed
//! for the process lifetime.
//!
//! Both backends propagate read failures; callers decide whether to
//! degrade. The only tolerated absence is a missing document file in
//! [`FileStore`], which means "no records yet", not a failure.

mod file;
mod supabase;

pub use file::FileStore;
pub use supabase::SupabaseStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::StorageConfig;
use crate::models::video::VideoRecord;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid video document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("supabase error with status {status}")]
    Remote { status: u16, body: String },

    #[error("supabase transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait VideoStore: Send + Sync {
    /// All records, newest upload first.
    async fn list(&self) -> Result<Vec<VideoRecord>, StorageError>;

    /// Records for one anime, ordered by ascending episode.
    async fn list_by_anime(&self, anime_id: &str) -> Result<Vec<VideoRecord>, StorageError>;

    /// Persists a new record and returns the stored row.
    async fn insert(&self, record: VideoRecord) -> Result<VideoRecord, StorageError>;
}

/// Selects the backend from configuration: both Supabase settings present
/// selects the remote table, anything else the local JSON document.
pub async fn connect(
    config: &StorageConfig,
    http: reqwest::Client,
) -> Result<Arc<dyn VideoStore>, StorageError> {
    if let Some((url, key)) = config.supabase() {
        info!("video storage: supabase table at {url}");
        Ok(Arc::new(SupabaseStore::new(url, key, http)))
    } else {
        info!("video storage: local document at {}", config.videos_file);
        Ok(Arc::new(FileStore::open(&config.videos_file).await?))
    }
}
