// src/mcp/mod.rs
// MCP Server implementation

pub mod tools;

use crate::fibery::FiberyClient;
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// MCP Server state
#[derive(Clone)]
pub struct FiberyServer {
    pub client: Arc<FiberyClient>,
    tool_router: ToolRouter<Self>,
}

impl FiberyServer {
    pub fn new(client: Arc<FiberyClient>) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }
}

// Request types for tools with parameters

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct QueryDatabaseRequest {
    #[schemars(description = "Database in \"Space/Type\" format, e.g. \"Software Development/Task\"")]
    pub source: String,
    #[schemars(
        description = "Fields to retrieve: object mapping aliases to field specs. Primitive: {\"Name\": \"Space/name\"}. Related: {\"State\": [\"workflow/state\", \"enum/name\"]}. Sub-query: {\"Tasks\": {\"q/from\": ..., \"q/select\": ..., \"q/limit\": 50}}"
    )]
    pub select: Map<String, Value>,
    #[schemars(
        description = "Filter conditions in array form [operator, [field_path], \"$param\"] or [\"q/and\"|\"q/or\", ...conditions]. Values must use $param placeholders defined in params, never literals. Operators: =, !=, <, <=, >, >=, q/contains, q/not-contains, q/in, q/not-in. No substring matching here; use the search tool"
    )]
    pub r#where: Option<Vec<Value>>,
    #[schemars(
        description = "Sort order as {\"Space/field\": \"q/asc\"|\"q/desc\", ...}; entry order is significant"
    )]
    pub order_by: Option<Map<String, Value>>,
    #[schemars(description = "Results per page (default 50, service cap 1000)")]
    pub limit: Option<i64>,
    #[schemars(description = "Results to skip, for pagination with limit and order_by")]
    pub offset: Option<i64>,
    #[schemars(
        description = "Values for $param placeholders used in where, e.g. {\"$status\": \"Active\"}. Required whenever where is present"
    )]
    pub params: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchEntitiesRequest {
    #[schemars(description = "Database in \"Space/Type\" format")]
    pub database: String,
    #[schemars(description = "Text to search for (case-insensitive substring matching)")]
    pub query: String,
    #[schemars(
        description = "Full field names to search in, e.g. [\"Software Development/name\"]. Default: the database's name field"
    )]
    pub search_fields: Option<Vec<String>>,
    #[schemars(
        description = "Fields to return, same format as select in query_database. Default: {\"Name\": \"Space/name\", \"Id\": \"fibery/id\"}"
    )]
    pub return_fields: Option<Map<String, Value>>,
    #[schemars(description = "Entities to scan in this batch (default 500)")]
    pub limit: Option<i64>,
    #[schemars(description = "Entities to skip before scanning (default 0)")]
    pub offset: Option<i64>,
}

#[tool_router]
impl FiberyServer {
    #[tool(
        description = "Run a structured query against a Fibery database. Rich text fields are resolved to their content transparently."
    )]
    async fn query_database(
        &self,
        Parameters(req): Parameters<QueryDatabaseRequest>,
    ) -> Result<String, String> {
        tracing::debug!(source = %req.source, "query_database");
        tools::query::handle_query(
            self.client.as_ref(),
            req.source,
            req.select,
            req.r#where,
            req.order_by,
            req.limit,
            req.offset,
            req.params,
        )
        .await
    }

    #[tool(
        description = "Find entities by case-insensitive substring match. Scans one batch of limit entities per call; re-invoke with the suggested offset to continue."
    )]
    async fn search_entities(
        &self,
        Parameters(req): Parameters<SearchEntitiesRequest>,
    ) -> Result<String, String> {
        tracing::debug!(database = %req.database, "search_entities");
        tools::search::handle_search(
            self.client.as_ref(),
            req.database,
            req.query,
            req.search_fields,
            req.return_fields,
            req.limit,
            req.offset,
        )
        .await
    }
}

#[tool_handler]
impl ServerHandler for FiberyServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: "fibery-mcp".into(),
                title: Some("Fibery MCP Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Query and search entities in a Fibery workspace. The backing service has no text search; use search_entities for substring matching and query_database for exact filters.".into(),
            ),
        }
    }
}
