// src/error.rs
// Standardized error types for the Fibery MCP server

use thiserror::Error;

/// Main error type for the fibery-mcp library
#[derive(Error, Debug)]
pub enum FiberyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown database: {0}")]
    UnknownDatabase(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fibery API error: {0}")]
    Api(String),
}

/// Convenience type alias for Result using FiberyError
pub type Result<T> = std::result::Result<T, FiberyError>;

impl From<FiberyError> for String {
    fn from(err: FiberyError) -> Self {
        err.to_string()
    }
}
