use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{StorageError, VideoStore};
use crate::models::video::VideoRecord;

/// Stores the full record list as one JSON array document.
///
/// `insert` is a read-modify-write of the whole document; `write_guard`
/// makes that a single critical section per process so concurrent uploads
/// cannot lose updates. Multiple processes writing the same file can still
/// race each other; known limitation, acceptable for the low-traffic
/// single-process deployments this backend targets.
pub struct FileStore {
    path: PathBuf,
    write_guard: Mutex<()>,
}

impl FileStore {
    /// Opens the store, creating the parent directory and an empty document
    /// on first run.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        if !tokio::fs::try_exists(&path).await? {
            tokio::fs::write(&path, b"[]").await?;
        }

        Ok(Self {
            path,
            write_guard: Mutex::new(()),
        })
    }

    async fn read_all(&self) -> Result<Vec<VideoRecord>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            // A missing document is first-run state, not a failure.
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_all(&self, records: &[VideoRecord]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl VideoStore for FileStore {
    async fn list(&self) -> Result<Vec<VideoRecord>, StorageError> {
        let mut records = self.read_all().await?;
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(records)
    }

    async fn list_by_anime(&self, anime_id: &str) -> Result<Vec<VideoRecord>, StorageError> {
        let mut records: Vec<VideoRecord> = self
            .read_all()
            .await?
            .into_iter()
            .filter(|record| record.anime_id == anime_id)
            .collect();
        records.sort_by_key(|record| record.episode);
        Ok(records)
    }

    async fn insert(&self, record: VideoRecord) -> Result<VideoRecord, StorageError> {
        let _guard = self.write_guard.lock().await;

        let mut records = self.read_all().await?;
        records.push(record.clone());
        self.write_all(&records).await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(anime_id: &str, episode: i32) -> VideoRecord {
        VideoRecord {
            id: format!("{anime_id}-{episode}-0"),
            anime_id: anime_id.to_string(),
            episode,
            title: format!("Episode {episode}"),
            embed_url: format!("https://example.com/embed/{episode}"),
            download_url: None,
            quality: None,
            uploaded_at: Utc::now() + Duration::seconds(i64::from(episode)),
        }
    }

    #[tokio::test]
    async fn open_creates_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("videos.json");

        let store = FileStore::open(&path).await.unwrap();

        assert!(path.exists());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_then_list_by_anime_orders_by_episode() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("videos.json")).await.unwrap();

        for episode in [3, 1, 2] {
            store.insert(record("100", episode)).await.unwrap();
        }
        store.insert(record("200", 1)).await.unwrap();

        let episodes: Vec<i32> = store
            .list_by_anime("100")
            .await
            .unwrap()
            .iter()
            .map(|r| r.episode)
            .collect();
        assert_eq!(episodes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("videos.json")).await.unwrap();

        store.insert(record("100", 1)).await.unwrap();
        store.insert(record("100", 2)).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].uploaded_at >= listed[1].uploaded_at);
    }

    #[tokio::test]
    async fn corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("videos.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = FileStore::open(&path).await.unwrap();

        assert!(matches!(
            store.list().await,
            Err(StorageError::Document(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_inserts_do_not_lose_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(
            FileStore::open(dir.path().join("videos.json")).await.unwrap(),
        );

        let mut handles = Vec::new();
        for episode in 1..=8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(record("100", episode)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.list().await.unwrap().len(), 8);
    }
}
