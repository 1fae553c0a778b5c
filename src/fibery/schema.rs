// src/fibery/schema.rs
// Workspace schema metadata, as returned by the fibery.schema/query command

use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;

/// Field type Fibery uses for long-form (rich text) content
pub const RICH_TEXT_TYPE: &str = "Collaboration~Documents/Document";

/// Second path segment that turns a rich text projection into its document handle
pub const DOCUMENT_SECRET_FIELD: &str = "Collaboration~Documents/secret";

/// Service-wide entity id field
pub const ID_FIELD: &str = "fibery/id";

/// Creation timestamp field, used for deterministic scan order
pub const CREATION_DATE_FIELD: &str = "fibery/creation-date";

/// One field of a database, e.g. "Software Development/name"
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaField {
    #[serde(rename = "fibery/name")]
    pub name: String,
    #[serde(rename = "fibery/type")]
    pub field_type: String,
}

impl SchemaField {
    /// Rich text fields are returned as document handles and need a second
    /// fetch to resolve their content
    pub fn is_rich_text(&self) -> bool {
        self.field_type == RICH_TEXT_TYPE
    }
}

/// One database (entity type) in "Space/Type" form
#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    #[serde(rename = "fibery/name")]
    pub name: String,
    #[serde(rename = "fibery/fields", default)]
    pub fields: Vec<SchemaField>,
}

impl Database {
    /// Look up a field by its full name ("Space/FieldName")
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The full workspace schema
#[derive(Debug, Clone, Deserialize)]
pub struct Schema {
    #[serde(rename = "fibery/types", default)]
    pub types: Vec<Database>,
}

impl Schema {
    /// Parse the result payload of a fibery.schema/query command
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Look up a database by its "Space/Type" identifier
    pub fn database(&self, name: &str) -> Option<&Database> {
        self.types.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Schema {
        Schema::from_value(json!({
            "fibery/types": [
                {
                    "fibery/name": "Sales/Lead",
                    "fibery/fields": [
                        { "fibery/name": "Sales/name", "fibery/type": "fibery/text" },
                        { "fibery/name": "Sales/Notes", "fibery/type": RICH_TEXT_TYPE },
                        { "fibery/name": "fibery/id", "fibery/type": "fibery/uuid" }
                    ]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_database_lookup() {
        let schema = sample_schema();
        assert!(schema.database("Sales/Lead").is_some());
        assert!(schema.database("Sales/Deal").is_none());
    }

    #[test]
    fn test_rich_text_detection() {
        let schema = sample_schema();
        let db = schema.database("Sales/Lead").unwrap();
        assert!(!db.field("Sales/name").unwrap().is_rich_text());
        assert!(db.field("Sales/Notes").unwrap().is_rich_text());
        assert!(db.field("Sales/missing").is_none());
    }

    #[test]
    fn test_schema_tolerates_missing_fields_list() {
        let schema = Schema::from_value(serde_json::json!({
            "fibery/types": [ { "fibery/name": "Ops/Task" } ]
        }))
        .unwrap();
        assert!(schema.database("Ops/Task").unwrap().fields.is_empty());
    }
}
