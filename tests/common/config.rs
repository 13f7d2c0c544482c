//! Endpoint configuration for live tests, loaded from the environment or `.env`

use hypersync_stream::ClientConfig;
use url::Url;

/// Error type for test configuration
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Load the live endpoint configuration
///
/// Required environment variables:
/// - `HYPERSYNC_BEARER_TOKEN` - API token
///
/// Optional environment variables:
/// - `HYPERSYNC_URL` - Endpoint base URL (default: the client's default endpoint)
pub fn load_live_config() -> Result<ClientConfig, ConfigError> {
    dotenvy::dotenv().ok();

    let token = std::env::var("HYPERSYNC_BEARER_TOKEN")
        .map_err(|_| ConfigError("HYPERSYNC_BEARER_TOKEN not set in environment".to_string()))?;

    let mut config = ClientConfig::default();
    if let Ok(url) = std::env::var("HYPERSYNC_URL") {
        config.url = Url::parse(&url).map_err(|e| ConfigError(format!("HYPERSYNC_URL: {e}")))?;
    }
    config.bearer_token = Some(token);
    Ok(config)
}

/// True if live credentials are available
pub fn has_live_credentials() -> bool {
    load_live_config().is_ok()
}
