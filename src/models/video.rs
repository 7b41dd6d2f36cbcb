use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One episode's playback metadata for one catalog anime entry.
///
/// Records are append-only: created by the admin upload endpoint, never
/// mutated or deleted afterwards. Wire field names are camelCase to match
/// the on-disk document and the Supabase `videos` table columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    /// Generated at creation, unique across the backend.
    pub id: String,

    pub anime_id: String,

    pub episode: i32,

    pub title: String,

    pub embed_url: String,

    #[serde(default)]
    pub download_url: Option<String>,

    #[serde(default)]
    pub quality: Option<String>,

    pub uploaded_at: DateTime<Utc>,
}
