//! Elasticsearch index mapping generated from an [`IndexDefinition`].
//!
//! Typed collections become `nested` fields so `name` and `value` of one
//! element are matched together. String values are `keyword` fields with a
//! `text` sub-field. Suggestion values also carry a `search_as_you_type`
//! sub-field; the suggester and cross-origin policy are recorded under
//! `_meta` next to the schema version, which the existence probe reads back.

use serde_json::{Map, Value, json};

use crate::schema::{FieldDeclaration, FieldKind, FieldType, IndexDefinition};

use super::backend::ElasticsearchConfig;

/// Sub-field holding the autocomplete analysis of suggestion values.
pub const SUGGEST_SUBFIELD: &str = "suggest";

/// Sub-field holding the analyzed text of string values.
pub const TEXT_SUBFIELD: &str = "text";

/// Creates the full index body: settings plus mappings.
pub fn create_index_mapping(config: &ElasticsearchConfig, definition: &IndexDefinition) -> Value {
    json!({
        "settings": {
            "number_of_shards": config.number_of_shards,
            "number_of_replicas": config.number_of_replicas,
            "index.max_result_window": config.max_result_window,
            "refresh_interval": config.refresh_interval,
        },
        "mappings": create_mappings(definition),
    })
}

/// Creates the `mappings` section, also used to update an existing index.
pub fn create_mappings(definition: &IndexDefinition) -> Value {
    json!({
        "dynamic": "strict",
        "_meta": {
            "schema_version": definition.schema_version,
            "key": definition.key_field().map(|f| f.name.as_str()),
            "suggesters": definition.suggesters,
            "cors": definition.cors,
        },
        "properties": properties(&definition.fields, None),
    })
}

/// Reads the schema version recorded in a get-mapping response.
pub fn recorded_schema_version(response: &Value) -> Option<u32> {
    response
        .as_object()?
        .values()
        .next()?
        .get("mappings")?
        .get("_meta")?
        .get("schema_version")?
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
}

fn properties(fields: &[FieldDeclaration], collection: Option<&str>) -> Value {
    let mut properties = Map::new();
    for field in fields {
        properties.insert(field.name.clone(), field_mapping(field, collection));
    }
    Value::Object(properties)
}

fn field_mapping(field: &FieldDeclaration, collection: Option<&str>) -> Value {
    match &field.field_type {
        FieldType::Collection(sub_fields) => json!({
            "type": "nested",
            "properties": properties(sub_fields, Some(&field.name)),
        }),
        FieldType::String if is_suggestion_value(field, collection) => json!({
            "type": "keyword",
            "fields": {
                TEXT_SUBFIELD: { "type": "text", "analyzer": "standard" },
                SUGGEST_SUBFIELD: { "type": "search_as_you_type" },
            },
        }),
        FieldType::String if field.searchable => json!({
            "type": "keyword",
            "fields": {
                TEXT_SUBFIELD: { "type": "text", "analyzer": "standard" },
            },
        }),
        FieldType::String => json!({ "type": "keyword" }),
        FieldType::Boolean => json!({ "type": "boolean" }),
        FieldType::Int32 => json!({ "type": "integer" }),
        FieldType::Int64 => json!({ "type": "long" }),
        FieldType::Double => json!({ "type": "double" }),
        FieldType::DateTime => json!({ "type": "date", "format": "strict_date_optional_time" }),
        FieldType::GeoPoint => json!({ "type": "geo_point" }),
    }
}

fn is_suggestion_value(field: &FieldDeclaration, collection: Option<&str>) -> bool {
    let suggestion = FieldKind::Suggestion;
    collection == Some(suggestion.field_name()) && field.name == suggestion.value_field()
}
