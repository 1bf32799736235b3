//! Resolved client configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Args;

/// Default storefront API root.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub api_url: String,
    pub timeout: Duration,
    /// Where the fallback device id lives. `None` uses the platform default.
    pub data_dir: Option<PathBuf>,
    pub fingerprint: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir: None,
            fingerprint: true,
        }
    }
}

impl From<&Args> for StoreConfig {
    fn from(args: &Args) -> Self {
        Self {
            api_url: args.api_url.clone(),
            // A zero timeout would fail every request immediately.
            timeout: Duration::from_secs(args.timeout.max(1)),
            data_dir: args.data_dir.clone(),
            fingerprint: !args.no_fingerprint,
        }
    }
}
