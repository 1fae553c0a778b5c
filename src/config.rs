// src/config.rs
// Environment-based configuration - single source of truth for all env vars

use crate::error::{FiberyError, Result};
use tracing::debug;

/// Connection settings for a Fibery workspace, loaded from environment
/// variables (FIBERY_HOST, FIBERY_API_TOKEN).
#[derive(Debug, Clone)]
pub struct FiberyConfig {
    /// Workspace host, e.g. "yourcompany.fibery.io" (no scheme)
    pub host: String,
    /// API token, sent as `Authorization: Token ...`
    pub api_token: String,
}

impl FiberyConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let host = read_var("FIBERY_HOST").ok_or_else(|| {
            FiberyError::Config(
                "FIBERY_HOST is not set (expected e.g. yourcompany.fibery.io)".to_string(),
            )
        })?;
        let api_token = read_var("FIBERY_API_TOKEN")
            .ok_or_else(|| FiberyError::Config("FIBERY_API_TOKEN is not set".to_string()))?;

        let config = Self {
            host: normalize_host(&host),
            api_token,
        };
        debug!(host = %config.host, "Fibery configuration loaded");
        Ok(config)
    }

    /// Base URL for API calls
    pub fn base_url(&self) -> String {
        format!("https://{}", self.host)
    }
}

/// Read a single env var, filtering empty values
fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Accept hosts pasted with a scheme or trailing slash
fn normalize_host(host: &str) -> String {
    host.trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}
