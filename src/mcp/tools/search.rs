// src/mcp/tools/search.rs
// search_entities: client-side substring scan over one query page

use crate::fibery::FiberyApi;
use crate::fibery::schema::{CREATION_DATE_FIELD, ID_FIELD};
use serde_json::{Map, Value, json};

/// Reserved prefix for synthetic select aliases; stripped before output
pub const SEARCH_PROBE_PREFIX: &str = "_search_";

/// Default page size for one scan batch
const DEFAULT_SEARCH_LIMIT: i64 = 500;

/// "Space/Type" identifier minus its final segment
fn space_of(database: &str) -> &str {
    match database.rfind('/') {
        Some(idx) => &database[..idx],
        None => "",
    }
}

/// Synthetic select alias for a field being scanned but not returned
fn probe_alias(field: &str) -> String {
    format!(
        "{}{}",
        SEARCH_PROBE_PREFIX,
        field.replace(['/', ' '], "_")
    )
}

/// Working select clause: return fields plus one probe alias per search
/// field, skipping probes whose exact field path is already returned.
fn build_search_select(
    search_fields: &[String],
    return_fields: &Map<String, Value>,
) -> Map<String, Value> {
    let mut select = return_fields.clone();
    for field in search_fields {
        let already_returned = return_fields
            .values()
            .any(|spec| spec.as_str() == Some(field.as_str()));
        if !already_returned {
            select.insert(probe_alias(field), json!(field));
        }
    }
    select
}

/// Locate a search field's value in an entity: probe alias first, then any
/// select alias whose spec equals the field path, then the raw key.
fn field_value<'a>(
    entity: &'a Map<String, Value>,
    field: &str,
    select: &Map<String, Value>,
) -> Option<&'a Value> {
    if let Some(value) = entity.get(&probe_alias(field)) {
        return Some(value);
    }
    if let Some((alias, _)) = select.iter().find(|(_, spec)| spec.as_str() == Some(field)) {
        if let Some(value) = entity.get(alias) {
            return Some(value);
        }
    }
    entity.get(field)
}

/// An entity matches if any search field's string value contains the
/// lower-cased query text. Non-string values never match.
fn entity_matches(
    entity: &Map<String, Value>,
    search_fields: &[String],
    select: &Map<String, Value>,
    needle: &str,
) -> bool {
    search_fields.iter().any(|field| {
        field_value(entity, field, select)
            .and_then(Value::as_str)
            .is_some_and(|s| s.to_lowercase().contains(needle))
    })
}

fn strip_probe_aliases(entity: &Map<String, Value>) -> Value {
    Value::Object(
        entity
            .iter()
            .filter(|(key, _)| !key.starts_with(SEARCH_PROBE_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

/// Scan one page of a database for case-insensitive substring matches.
/// Pagination is caller-driven: a full page yields a continuation hint,
/// never an automatic follow-up call.
pub async fn handle_search(
    client: &dyn FiberyApi,
    database: String,
    query: String,
    search_fields: Option<Vec<String>>,
    return_fields: Option<Map<String, Value>>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<String, String> {
    let needle = query.to_lowercase();
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let offset = offset.unwrap_or(0);
    let space = space_of(&database);

    let search_fields = match search_fields {
        Some(fields) if !fields.is_empty() => fields,
        _ => vec![format!("{}/name", space)],
    };
    let return_fields = match return_fields {
        Some(fields) if !fields.is_empty() => fields,
        _ => {
            let mut defaults = Map::new();
            defaults.insert("Name".to_string(), json!(format!("{}/name", space)));
            defaults.insert("Id".to_string(), json!(ID_FIELD));
            defaults
        }
    };

    let select = build_search_select(&search_fields, &return_fields);

    let mut query_doc = Map::new();
    query_doc.insert("q/from".to_string(), json!(database));
    query_doc.insert("q/select".to_string(), Value::Object(select.clone()));
    query_doc.insert("q/limit".to_string(), json!(limit));
    query_doc.insert("q/offset".to_string(), json!(offset));
    // Deterministic scan order across repeated calls at increasing offsets
    query_doc.insert(
        "q/order-by".to_string(),
        json!([[[CREATION_DATE_FIELD], "q/desc"]]),
    );

    let command_result = client
        .query(Value::Object(query_doc), None)
        .await
        .map_err(|e| e.to_string())?;

    if !command_result.success {
        return Ok(format!(
            "Error querying database: {}",
            command_result.result
        ));
    }

    let entities = command_result
        .result
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();

    let matches: Vec<Value> = entities
        .iter()
        .filter_map(Value::as_object)
        .filter(|entity| entity_matches(entity, &search_fields, &select, &needle))
        .map(strip_probe_aliases)
        .collect();

    let mut text = format!(
        "Scanned {} entities (offset {}, limit {}). Found {} matches:\n\n",
        entities.len(),
        offset,
        limit,
        matches.len()
    );
    text.push_str(&json!({ "success": true, "result": matches }).to_string());

    // Heuristic: a full page may not be exhausted
    if entities.len() as i64 == limit {
        text.push_str(&format!(
            "\n\nTo continue searching, call this tool again with offset={}.",
            offset + limit
        ));
    }

    Ok(text)
}
