//! The document schema and the index definition generated from it.

mod definition;
mod document;

pub use definition::{
    CORS_MAX_AGE_SECONDS, CorsOptions, FieldDeclaration, FieldType, IndexDefinition,
    SCHEMA_VERSION, SUGGESTER_NAME, Suggester,
};
pub use document::{FieldKind, ScalarField, SearchDocument};
