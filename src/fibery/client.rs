// src/fibery/client.rs
// HTTP client for the Fibery commands and documents APIs

use crate::config::FiberyConfig;
use crate::error::{FiberyError, Result};
use crate::fibery::schema::Schema;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// HTTP timeout
const TIMEOUT_SECS: u64 = 30;

/// Outcome of one command: a success flag plus the command's payload
/// (entity records on success, error detail on failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    #[serde(default)]
    pub result: Value,
}

impl fmt::Display for CommandResult {
    /// The `{"success": ..., "result": ...}` text that tools return verbatim
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            json!({ "success": self.success, "result": self.result })
        )
    }
}

/// Remote operations the tools depend on.
/// Implemented by FiberyClient (HTTP) and by MockFibery in tests.
#[async_trait]
pub trait FiberyApi: Send + Sync {
    /// Fetch the workspace schema (one lookup per query-handling call)
    async fn get_schema(&self) -> Result<Schema>;

    /// Run a wire query document, with optional `$name` parameter values
    async fn query(&self, query: Value, params: Option<Map<String, Value>>)
    -> Result<CommandResult>;

    /// Resolve a rich text document handle to its markdown content
    async fn get_document_content(&self, secret: &str) -> Result<String>;
}

/// Fibery workspace client
pub struct FiberyClient {
    config: FiberyConfig,
    http_client: reqwest::Client,
}

impl FiberyClient {
    pub fn new(config: FiberyConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config,
            http_client,
        }
    }

    /// POST a single command to /api/commands and return its result
    async fn execute_command(&self, command: Value) -> Result<CommandResult> {
        let url = format!("{}/api/commands", self.config.base_url());
        debug!(url = %url, "Executing Fibery command");

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Token {}", self.config.api_token))
            .json(&json!([command]))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FiberyError::Api(format!("API error {}: {}", status, text)));
        }

        let mut results: Vec<CommandResult> = response.json().await?;
        if results.is_empty() {
            return Err(FiberyError::Api(
                "empty response for command batch".to_string(),
            ));
        }
        Ok(results.remove(0))
    }
}

#[async_trait]
impl FiberyApi for FiberyClient {
    async fn get_schema(&self) -> Result<Schema> {
        let result = self
            .execute_command(json!({ "command": "fibery.schema/query" }))
            .await?;
        if !result.success {
            return Err(FiberyError::Api(format!(
                "schema query failed: {}",
                result.result
            )));
        }
        Schema::from_value(result.result)
    }

    async fn query(
        &self,
        query: Value,
        params: Option<Map<String, Value>>,
    ) -> Result<CommandResult> {
        let mut args = Map::new();
        args.insert("query".to_string(), query);
        if let Some(params) = params {
            args.insert("params".to_string(), Value::Object(params));
        }
        self.execute_command(json!({ "command": "fibery.entity/query", "args": args }))
            .await
    }

    async fn get_document_content(&self, secret: &str) -> Result<String> {
        let url = format!(
            "{}/api/documents/{}?format=md",
            self.config.base_url(),
            secret
        );

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Token {}", self.config.api_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FiberyError::Api(format!(
                "document fetch error {}: {}",
                status, text
            )));
        }

        let body: Value = response.json().await?;
        match body.get("content").and_then(Value::as_str) {
            Some(content) => Ok(content.to_string()),
            None => Err(FiberyError::Api(format!(
                "document {} has no content",
                secret
            ))),
        }
    }
}
