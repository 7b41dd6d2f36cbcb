use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub upstream: UpstreamConfig,

    pub admin: AdminConfig,

    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// MAL API client id; empty means unset.
    pub client_id: String,

    /// MAL API client secret; empty means unset.
    pub client_secret: String,

    pub api_base: String,

    pub token_url: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            api_base: "https://api.myanimelist.net/v2".to_string(),
            token_url: "https://myanimelist.net/v1/oauth2/token".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared secret required by the upload endpoint.
    pub token: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            token: "changeme".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Location of the JSON document used by the file backend.
    pub videos_file: String,

    pub supabase_url: Option<String>,

    pub supabase_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            videos_file: "data/videos.json".to_string(),
            supabase_url: None,
            supabase_key: None,
        }
    }
}

impl StorageConfig {
    /// Both Supabase settings present and non-empty selects the remote
    /// table backend.
    #[must_use]
    pub fn supabase(&self) -> Option<(&str, &str)> {
        match (self.supabase_url.as_deref(), self.supabase_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Some((url, key)),
            _ => None,
        }
    }
}

impl Config {
    /// Loads configuration from the first config.toml found, then applies
    /// environment overrides (including a `.env` file when present).
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_file()?;
        config.overlay_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("malgate").join("config.toml"));
        }

        paths
    }

    /// Environment variables override file values so deployments can keep
    /// secrets out of config.toml. Takes a lookup closure so tests do not
    /// have to mutate the process environment.
    pub fn overlay_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(id) = var("MAL_CLIENT_ID") {
            self.upstream.client_id = id;
        }
        if let Some(secret) = var("MAL_CLIENT_SECRET") {
            self.upstream.client_secret = secret;
        }
        if let Some(token) = var("ADMIN_TOKEN") {
            self.admin.token = token;
        }
        if let Some(url) = var("SUPABASE_URL") {
            self.storage.supabase_url = Some(url);
        }
        if let Some(key) = var("SUPABASE_KEY") {
            self.storage.supabase_key = Some(key);
        }
        if let Some(port) = var("PORT").and_then(|port| port.parse().ok()) {
            self.server.port = port;
        }
    }

    /// Missing upstream credentials are not fatal: the process can still
    /// serve video routes, and token exchange will surface the failure.
    pub fn validate(&self) {
        if self.upstream.client_id.is_empty() || self.upstream.client_secret.is_empty() {
            warn!("MAL_CLIENT_ID or MAL_CLIENT_SECRET not set; upstream requests will fail");
        }
    }
}
