use std::sync::Arc;

use crate::clients::mal::MalClient;
use crate::config::Config;
use crate::store::{self, VideoStore};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused across all HTTP-based components to enable connection pooling
/// and avoid socket exhaustion.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("malgate/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Everything a request handler may touch. Created once at startup; the
/// storage backend choice is fixed for the process lifetime.
pub struct AppState {
    pub config: Config,

    pub mal: Arc<MalClient>,

    pub store: Arc<dyn VideoStore>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let http = build_shared_http_client(config.upstream.request_timeout_seconds)?;

        let mal = Arc::new(MalClient::new(&config.upstream, http.clone()));
        let store = store::connect(&config.storage, http).await?;

        Ok(Self { config, mal, store })
    }
}
