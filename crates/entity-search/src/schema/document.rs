//! The fixed-shape search document.
//!
//! A [`SearchDocument`] has one typed collection per primitive kind plus a
//! handful of scalar fields. The field set is closed: [`FieldKind::ALL`] and
//! [`ScalarField::ALL`] enumerate every field, and the index definition is
//! generated from them, so the document and the remote index cannot diverge.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::definition::{FieldDeclaration, FieldType};
use crate::types::{GeoPoint, Property, RelatedId};

/// The typed attribute collections of a search document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Boolean attributes (`bl`).
    Bool,
    /// String attributes (`str`).
    Str,
    /// Enumeration attributes stored as strings (`enm`).
    Enum,
    /// Datetime attributes (`dt`).
    DateTime,
    /// Double attributes (`dbl`).
    Double,
    /// 64-bit integer attributes (`num64`).
    Int64,
    /// 32-bit integer attributes (`num32`).
    Int32,
    /// Geo-point attributes (`geo`).
    GeoPoint,
    /// Related entity references (`rel`).
    Related,
    /// Suggestion text (`sug`).
    Suggestion,
}

impl FieldKind {
    /// Every collection kind, in declaration order.
    pub const ALL: [FieldKind; 10] = [
        FieldKind::Bool,
        FieldKind::Str,
        FieldKind::Enum,
        FieldKind::DateTime,
        FieldKind::Double,
        FieldKind::Int64,
        FieldKind::Int32,
        FieldKind::GeoPoint,
        FieldKind::Related,
        FieldKind::Suggestion,
    ];

    /// The document field holding this collection.
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bl",
            FieldKind::Str => "str",
            FieldKind::Enum => "enm",
            FieldKind::DateTime => "dt",
            FieldKind::Double => "dbl",
            FieldKind::Int64 => "num64",
            FieldKind::Int32 => "num32",
            FieldKind::GeoPoint => "geo",
            FieldKind::Related => "rel",
            FieldKind::Suggestion => "sug",
        }
    }

    /// The element field holding the attribute value.
    pub fn value_field(&self) -> &'static str {
        match self {
            FieldKind::Related => "id",
            _ => "value",
        }
    }

    /// The declared type of the element value.
    pub fn value_type(&self) -> FieldType {
        match self {
            FieldKind::Bool => FieldType::Boolean,
            FieldKind::Str | FieldKind::Enum | FieldKind::Related | FieldKind::Suggestion => {
                FieldType::String
            }
            FieldKind::DateTime => FieldType::DateTime,
            FieldKind::Double => FieldType::Double,
            FieldKind::Int64 => FieldType::Int64,
            FieldKind::Int32 => FieldType::Int32,
            FieldKind::GeoPoint => FieldType::GeoPoint,
        }
    }

    /// Returns the declared type of an element field, if it exists.
    pub fn element_field_type(&self, field: &str) -> Option<FieldType> {
        if field == "name" {
            Some(FieldType::String)
        } else if field == self.value_field() {
            Some(self.value_type())
        } else {
            None
        }
    }

    /// Looks up a collection by its document field name.
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.field_name() == name)
    }

    fn declaration(&self) -> FieldDeclaration {
        let value_searchable = matches!(self, FieldKind::Str | FieldKind::Suggestion);
        FieldDeclaration::collection(
            self.field_name(),
            vec![
                FieldDeclaration::new("name", FieldType::String),
                FieldDeclaration::new(self.value_field(), self.value_type())
                    .searchable(value_searchable),
            ],
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field_name())
    }
}

/// The scalar fields of a search document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    /// Document key.
    Id,
    /// Entity type discriminator.
    Index,
    /// Creation timestamp.
    Created,
    /// Change-detection hash.
    Hh,
    /// Change-detection hash.
    Hm,
}

impl ScalarField {
    /// Every scalar field, in declaration order.
    pub const ALL: [ScalarField; 5] = [
        ScalarField::Id,
        ScalarField::Index,
        ScalarField::Created,
        ScalarField::Hh,
        ScalarField::Hm,
    ];

    /// The document field name.
    pub fn field_name(&self) -> &'static str {
        match self {
            ScalarField::Id => "id",
            ScalarField::Index => "index",
            ScalarField::Created => "created",
            ScalarField::Hh => "hh",
            ScalarField::Hm => "hm",
        }
    }

    /// The declared field type.
    pub fn field_type(&self) -> FieldType {
        match self {
            ScalarField::Created => FieldType::DateTime,
            _ => FieldType::String,
        }
    }

    /// Looks up a scalar field by name.
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.field_name() == name)
    }

    fn declaration(&self) -> FieldDeclaration {
        let declaration = FieldDeclaration::new(self.field_name(), self.field_type());
        match self {
            ScalarField::Id => declaration.key(),
            _ => declaration,
        }
    }
}

/// A search document as stored in the remote index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    /// Document key.
    pub id: String,
    /// Entity type discriminator.
    pub index: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Change-detection hash.
    #[serde(default)]
    pub hh: Option<String>,
    /// Change-detection hash.
    #[serde(default)]
    pub hm: Option<String>,
    /// Boolean attributes.
    #[serde(rename = "bl", default)]
    pub booleans: Vec<Property<bool>>,
    /// String attributes.
    #[serde(rename = "str", default)]
    pub strings: Vec<Property<String>>,
    /// Enumeration attributes.
    #[serde(rename = "enm", default)]
    pub enums: Vec<Property<String>>,
    /// Datetime attributes.
    #[serde(rename = "dt", default)]
    pub dates: Vec<Property<DateTime<Utc>>>,
    /// Double attributes.
    #[serde(rename = "dbl", default)]
    pub doubles: Vec<Property<f64>>,
    /// 64-bit integer attributes.
    #[serde(rename = "num64", default)]
    pub int64s: Vec<Property<i64>>,
    /// 32-bit integer attributes.
    #[serde(rename = "num32", default)]
    pub int32s: Vec<Property<i32>>,
    /// Geo-point attributes.
    #[serde(rename = "geo", default)]
    pub geo_points: Vec<Property<GeoPoint>>,
    /// Related entity references.
    #[serde(rename = "rel", default)]
    pub relations: Vec<RelatedId>,
    /// Suggestion text.
    #[serde(rename = "sug", default)]
    pub suggestions: Vec<Property<String>>,
}

impl SearchDocument {
    /// Declares every field of the document, scalars first.
    pub fn fields() -> Vec<FieldDeclaration> {
        ScalarField::ALL
            .iter()
            .map(ScalarField::declaration)
            .chain(FieldKind::ALL.iter().map(FieldKind::declaration))
            .collect()
    }
}
