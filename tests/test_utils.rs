//! Test utilities for fibery-mcp integration tests

use async_trait::async_trait;
use fibery_mcp::fibery::{CommandResult, FiberyApi, Schema};
use fibery_mcp::{FiberyError, Result};
use serde_json::{Map, Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// In-memory FiberyApi with canned schema, query results and documents.
/// Records every executed wire document for assertions.
pub struct MockFibery {
    schema: Schema,
    query_results: Mutex<VecDeque<CommandResult>>,
    documents: HashMap<String, String>,
    pub queries: Mutex<Vec<(Value, Option<Map<String, Value>>)>>,
}

impl MockFibery {
    pub fn new() -> Self {
        Self {
            schema: sample_schema(),
            query_results: Mutex::new(VecDeque::new()),
            documents: HashMap::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Enqueue the result of the next query execution
    pub fn push_result(&self, result: CommandResult) {
        self.query_results.lock().unwrap().push_back(result);
    }

    pub fn push_success(&self, entities: Value) {
        self.push_result(CommandResult {
            success: true,
            result: entities,
        });
    }

    pub fn push_failure(&self, detail: Value) {
        self.push_result(CommandResult {
            success: false,
            result: detail,
        });
    }

    pub fn add_document(&mut self, secret: &str, content: &str) {
        self.documents.insert(secret.to_string(), content.to_string());
    }

    /// Wire documents executed so far
    pub fn executed_queries(&self) -> Vec<Value> {
        self.queries.lock().unwrap().iter().map(|(q, _)| q.clone()).collect()
    }
}

#[async_trait]
impl FiberyApi for MockFibery {
    async fn get_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn query(
        &self,
        query: Value,
        params: Option<Map<String, Value>>,
    ) -> Result<CommandResult> {
        self.queries.lock().unwrap().push((query, params));
        Ok(self
            .query_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(CommandResult {
                success: true,
                result: json!([]),
            }))
    }

    async fn get_document_content(&self, secret: &str) -> Result<String> {
        self.documents
            .get(secret)
            .cloned()
            .ok_or_else(|| FiberyError::Api(format!("document {} has no content", secret)))
    }
}

/// Workspace schema shared by the integration tests: one database with a
/// plain text field, a rich text field and the id field.
pub fn sample_schema() -> Schema {
    Schema::from_value(json!({
        "fibery/types": [
            {
                "fibery/name": "Sales/Lead",
                "fibery/fields": [
                    { "fibery/name": "Sales/name", "fibery/type": "Collaboration~Documents/Document" },
                    { "fibery/name": "Sales/Stage", "fibery/type": "fibery/text" },
                    { "fibery/name": "fibery/id", "fibery/type": "fibery/uuid" }
                ]
            }
        ]
    }))
    .expect("sample schema should parse")
}

/// Shorthand for building select/params maps from json literals
pub fn as_map(value: Value) -> Map<String, Value> {
    value.as_object().expect("expected a JSON object").clone()
}
