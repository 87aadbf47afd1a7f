//! Client configuration.
//!
//! Loaded from environment variables with fallback to defaults:
//! - `STOCKROOM_API_URL` - API base including `/api/v1` (default: http://localhost:8000/api/v1)
//! - `STOCKROOM_ACCESS_TOKEN` - bearer token sent with every request
//! - `STOCKROOM_CART_PATH` - stored cart file (default: platform data dir)
//! - `STOCKROOM_REQUEST_TIMEOUT_SECS` - per-request timeout (default: 30)

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without trailing slash.
    pub api_url: String,
    pub access_token: Option<String>,
    /// Explicit cart file; `None` uses the platform data dir.
    pub cart_path: Option<PathBuf>,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: DEFAULT_API_URL.to_string(),
            access_token: None,
            cart_path: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        ClientConfig {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let mut config = ClientConfig::new(
            env::var("STOCKROOM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        );

        if !(config.api_url.starts_with("http://") || config.api_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "STOCKROOM_API_URL must be an http(s) URL, got {}",
                config.api_url
            )));
        }

        if let Ok(token) = env::var("STOCKROOM_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                config.access_token = Some(token);
            }
        }

        if let Ok(path) = env::var("STOCKROOM_CART_PATH") {
            debug!(path = %path, "Overriding cart path from environment");
            config.cart_path = Some(PathBuf::from(path));
        }

        if let Ok(secs) = env::var("STOCKROOM_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ClientError::Config("STOCKROOM_REQUEST_TIMEOUT_SECS must be a number".to_string())
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Where the cart is stored.
    pub fn resolved_cart_path(&self) -> ClientResult<PathBuf> {
        match &self.cart_path {
            Some(path) => Ok(path.clone()),
            None => default_cart_path()
                .ok_or_else(|| ClientError::Config("no home directory for the cart file".to_string())),
        }
    }
}

/// Returns the default cart file path.
fn default_cart_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "stockroom", "stockroom")
        .map(|dirs| dirs.data_dir().join("cart.json"))
}
