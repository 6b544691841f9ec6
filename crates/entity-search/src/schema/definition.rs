//! Index definitions declared to the search service.

use serde::{Deserialize, Serialize};

use super::document::{FieldKind, SearchDocument};

/// Version of the document schema. Bump whenever [`SearchDocument`] or the
/// generated field declarations change.
pub const SCHEMA_VERSION: u32 = 1;

/// Name of the suggester attached to every index.
pub const SUGGESTER_NAME: &str = "sug";

/// Maximum age, in seconds, that browsers may cache CORS preflight results.
pub const CORS_MAX_AGE_SECONDS: u64 = 300;

/// Declared type of an index field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// Boolean.
    Boolean,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Double-precision float.
    Double,
    /// Timestamp with offset.
    DateTime,
    /// Geographic point.
    GeoPoint,
    /// A collection of complex elements with the given sub-fields.
    Collection(Vec<FieldDeclaration>),
}

/// One field of an index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    /// The field name.
    pub name: String,
    /// The declared type.
    pub field_type: FieldType,
    /// Whether this field is the document key.
    pub key: bool,
    /// Whether the field can be used in filter expressions.
    pub filterable: bool,
    /// Whether the field takes part in full-text search.
    pub searchable: bool,
}

impl FieldDeclaration {
    /// Declares a filterable, non-searchable field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            key: false,
            filterable: true,
            searchable: false,
        }
    }

    /// Declares a collection of complex elements.
    pub fn collection(name: impl Into<String>, fields: Vec<FieldDeclaration>) -> Self {
        Self::new(name, FieldType::Collection(fields))
    }

    /// Marks the field as the document key.
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Sets whether the field is full-text searchable.
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Returns the sub-fields of a collection field.
    pub fn sub_fields(&self) -> &[FieldDeclaration] {
        match &self.field_type {
            FieldType::Collection(fields) => fields,
            _ => &[],
        }
    }
}

/// An autocomplete suggester over one or more source fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggester {
    /// The suggester name.
    pub name: String,
    /// Paths of the fields that feed suggestions (e.g. `sug/value`).
    pub source_fields: Vec<String>,
}

/// Cross-origin access policy for the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsOptions {
    /// Origins allowed to query the index; `*` allows any.
    pub allowed_origins: Vec<String>,
    /// Preflight cache duration in seconds.
    pub max_age_seconds: u64,
}

impl CorsOptions {
    /// Allows every origin with the given cache age.
    pub fn permissive(max_age_seconds: u64) -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_age_seconds,
        }
    }
}

/// A complete index definition: fields, suggester and CORS policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// The index name.
    pub name: String,
    /// Field declarations.
    pub fields: Vec<FieldDeclaration>,
    /// Suggesters attached to the index.
    pub suggesters: Vec<Suggester>,
    /// Cross-origin policy.
    pub cors: CorsOptions,
    /// Document schema version the definition was generated from.
    pub schema_version: u32,
}

impl IndexDefinition {
    /// Builds the definition of an index holding [`SearchDocument`]s.
    pub fn for_index(name: impl Into<String>) -> Self {
        let suggestion = FieldKind::Suggestion;
        Self {
            name: name.into(),
            fields: SearchDocument::fields(),
            suggesters: vec![Suggester {
                name: SUGGESTER_NAME.to_string(),
                source_fields: vec![format!(
                    "{}/{}",
                    suggestion.field_name(),
                    suggestion.value_field()
                )],
            }],
            cors: CorsOptions::permissive(CORS_MAX_AGE_SECONDS),
            schema_version: SCHEMA_VERSION,
        }
    }

    /// Returns the declaration of the key field.
    pub fn key_field(&self) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|f| f.key)
    }

    /// Looks up a top-level field.
    pub fn field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|f| f.name == name)
    }
}
