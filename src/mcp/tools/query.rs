// src/mcp/tools/query.rs
// query_database: wire document building, rich text resolution, execution

use crate::error::FiberyError;
use crate::fibery::FiberyApi;
use crate::fibery::schema::{DOCUMENT_SECRET_FIELD, Database};
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Default page size when the caller omits limit (service caps at 1000)
const DEFAULT_QUERY_LIMIT: i64 = 50;

/// One select-clause entry, resolved once at the select boundary.
/// Anything that fails to parse into one of these shapes is left untouched
/// by the rich text resolver.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    /// "Space/FieldName"
    Primitive(String),
    /// ["related entity", "field"] path segments
    Related(Vec<String>),
    /// Nested {"q/from": ..., "q/select": ...} sub-query
    SubQuery(Map<String, Value>),
}

impl FieldSpec {
    /// The field name to look up in schema metadata. Sub-queries have none.
    pub fn leaf_field(&self) -> Option<&str> {
        match self {
            FieldSpec::Primitive(name) => Some(name),
            FieldSpec::Related(path) => path.first().map(String::as_str),
            FieldSpec::SubQuery(_) => None,
        }
    }
}

/// A select entry whose projection was rewritten to the document handle path;
/// consumed after execution to fetch the real content.
#[derive(Debug, Clone)]
pub struct RichTextField {
    pub alias: String,
    pub name: String,
}

/// Find rich text fields in the select clause and substitute their
/// projections with the two-segment document handle path.
///
/// Best-effort by contract: sub-queries, unknown field names and
/// unparseable spec shapes pass through unchanged.
pub fn collect_rich_text_fields(
    select: &Map<String, Value>,
    database: &Database,
) -> (Vec<RichTextField>, Map<String, Value>) {
    let mut rich_text_fields = Vec::new();
    let mut safe_select = select.clone();

    for (alias, spec_value) in select {
        let Ok(spec) = serde_json::from_value::<FieldSpec>(spec_value.clone()) else {
            continue;
        };
        let Some(name) = spec.leaf_field() else {
            continue;
        };
        let Some(field) = database.field(name) else {
            continue;
        };
        if field.is_rich_text() {
            rich_text_fields.push(RichTextField {
                alias: alias.clone(),
                name: name.to_string(),
            });
            safe_select.insert(alias.clone(), json!([name, DOCUMENT_SECRET_FIELD]));
        }
    }

    (rich_text_fields, safe_select)
}

/// Convert the caller's ordered field->direction mapping into the wire's
/// list-of-pairs form, preserving insertion order. Direction tokens pass
/// through unvalidated.
pub fn parse_order_by(order_by: Option<&Map<String, Value>>) -> Option<Value> {
    let order_by = order_by.filter(|m| !m.is_empty())?;
    Some(Value::Array(
        order_by
            .iter()
            .map(|(field, direction)| json!([[field], direction]))
            .collect(),
    ))
}

fn collect_placeholders(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if s.starts_with('$') => out.push(s.clone()),
        Value::Array(items) => {
            for item in items {
                collect_placeholders(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_placeholders(item, out);
            }
        }
        _ => {}
    }
}

/// Every `$name` placeholder in the where tree must have a matching params
/// key; execution is never attempted with an unresolved one.
pub fn unresolved_placeholders(
    clauses: &[Value],
    params: Option<&Map<String, Value>>,
) -> Vec<String> {
    let mut placeholders = Vec::new();
    for clause in clauses {
        collect_placeholders(clause, &mut placeholders);
    }
    let mut unresolved: Vec<String> = Vec::new();
    for placeholder in placeholders {
        let bound = params.is_some_and(|m| m.contains_key(&placeholder));
        if !bound && !unresolved.contains(&placeholder) {
            unresolved.push(placeholder);
        }
    }
    unresolved
}

/// Assemble the wire document. Optional clauses are omitted when absent,
/// never sent as null or empty placeholders.
pub fn build_query_document(
    source: &str,
    select: Map<String, Value>,
    r#where: Option<&Vec<Value>>,
    order_by: Option<&Map<String, Value>>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Value {
    let mut query = Map::new();
    query.insert("q/from".to_string(), json!(source));
    query.insert("q/select".to_string(), Value::Object(select));
    query.insert(
        "q/limit".to_string(),
        json!(limit.unwrap_or(DEFAULT_QUERY_LIMIT)),
    );
    if let Some(clauses) = r#where {
        query.insert("q/where".to_string(), json!(clauses));
    }
    if let Some(order) = parse_order_by(order_by) {
        query.insert("q/order-by".to_string(), order);
    }
    if let Some(offset) = offset {
        query.insert("q/offset".to_string(), json!(offset));
    }
    Value::Object(query)
}

/// Run a structured query: schema fetch, rich text substitution, execution,
/// then one content fetch per flagged alias per returned entity.
#[allow(clippy::too_many_arguments)]
pub async fn handle_query(
    client: &dyn FiberyApi,
    source: String,
    select: Map<String, Value>,
    r#where: Option<Vec<Value>>,
    order_by: Option<Map<String, Value>>,
    limit: Option<i64>,
    offset: Option<i64>,
    params: Option<Map<String, Value>>,
) -> Result<String, String> {
    if let Some(clauses) = &r#where {
        let unresolved = unresolved_placeholders(clauses, params.as_ref());
        if !unresolved.is_empty() {
            return Err(FiberyError::InvalidInput(format!(
                "unresolved placeholders in where clause (add them to params): {}",
                unresolved.join(", ")
            ))
            .into());
        }
    }

    let schema = client.get_schema().await.map_err(|e| e.to_string())?;
    let database = schema
        .database(&source)
        .ok_or_else(|| String::from(FiberyError::UnknownDatabase(source.clone())))?;

    let (rich_text_fields, safe_select) = collect_rich_text_fields(&select, database);
    let query = build_query_document(
        &source,
        safe_select,
        r#where.as_ref(),
        order_by.as_ref(),
        limit,
        offset,
    );

    let mut command_result = client.query(query, params).await.map_err(|e| e.to_string())?;

    if !command_result.success {
        return Ok(command_result.to_string());
    }

    if !rich_text_fields.is_empty()
        && let Some(entities) = command_result.result.as_array_mut()
    {
        for entity in entities {
            for field in &rich_text_fields {
                // A missing or empty handle is a schema/query mismatch:
                // abort the whole call, no partial results.
                let secret = entity
                    .get(&field.alias)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                let Some(secret) = secret else {
                    return Ok(format!(
                        "Unable to get document content for entity {}. Field: {}",
                        entity,
                        json!({ "alias": field.alias, "name": field.name })
                    ));
                };
                let content = client
                    .get_document_content(&secret)
                    .await
                    .map_err(|e| e.to_string())?;
                if let Some(record) = entity.as_object_mut() {
                    record.insert(field.alias.clone(), Value::String(content));
                }
            }
        }
    }

    Ok(command_result.to_string())
}
