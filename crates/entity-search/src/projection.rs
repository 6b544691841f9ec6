//! Projection between attribute-bag entities and search documents.
//!
//! [`Projector::to_document`] copies every typed sequence of an [`Entity`]
//! element-wise into a [`SearchDocument`], and [`Projector::from_document`]
//! is its exact inverse. For a well-formed entity (unique names within each
//! typed sequence):
//!
//! ```
//! use entity_search::projection::Projector;
//! use entity_search::types::Entity;
//!
//! let projector = Projector::default();
//! let entity = Entity::new("a", "order").with_str("city", "X");
//! let document = projector.to_document(&entity).unwrap();
//! assert_eq!(projector.from_document(document), entity);
//! ```

use std::collections::HashMap;

use crate::config::DuplicatePolicy;
use crate::error::ProjectionError;
use crate::schema::{FieldKind, SearchDocument};
use crate::types::{Entity, Named, Property};

/// Maps entities to documents and back.
#[derive(Debug, Clone, Copy, Default)]
pub struct Projector {
    duplicates: DuplicatePolicy,
}

impl Projector {
    /// Creates a projector with the given duplicate name policy.
    pub fn new(duplicates: DuplicatePolicy) -> Self {
        Self { duplicates }
    }

    /// Projects an entity onto the document schema.
    ///
    /// Never fails for well-formed entities. A repeated attribute name within
    /// one typed sequence is resolved by the configured [`DuplicatePolicy`].
    ///
    /// Doubles and geo-point coordinates must be finite; NaN and infinities
    /// fail with [`ProjectionError::NonFiniteNumber`].
    pub fn to_document(&self, entity: &Entity) -> Result<SearchDocument, ProjectionError> {
        let id = entity.id.as_str();
        ensure_finite(id, FieldKind::Double, &entity.doubles, |v| v.is_finite())?;
        ensure_finite(id, FieldKind::GeoPoint, &entity.geo_points, |p| {
            p.lat.is_finite() && p.lon.is_finite()
        })?;
        Ok(SearchDocument {
            id: entity.id.clone(),
            index: entity.index.clone(),
            created: entity.created,
            hh: entity.hh.clone(),
            hm: entity.hm.clone(),
            booleans: self.copy(id, FieldKind::Bool, &entity.booleans)?,
            strings: self.copy(id, FieldKind::Str, &entity.strings)?,
            enums: self.copy(id, FieldKind::Enum, &entity.enums)?,
            dates: self.copy(id, FieldKind::DateTime, &entity.dates)?,
            doubles: self.copy(id, FieldKind::Double, &entity.doubles)?,
            int64s: self.copy(id, FieldKind::Int64, &entity.int64s)?,
            int32s: self.copy(id, FieldKind::Int32, &entity.int32s)?,
            geo_points: self.copy(id, FieldKind::GeoPoint, &entity.geo_points)?,
            relations: self.copy(id, FieldKind::Related, &entity.relations)?,
            suggestions: self.copy(id, FieldKind::Suggestion, &entity.suggestions)?,
        })
    }

    /// Projects many entities, failing on the first one that cannot be projected.
    pub fn to_documents(&self, entities: &[Entity]) -> Result<Vec<SearchDocument>, ProjectionError> {
        entities.iter().map(|e| self.to_document(e)).collect()
    }

    /// Projects a document back to an entity. Every field is carried over unchanged.
    pub fn from_document(&self, document: SearchDocument) -> Entity {
        Entity {
            id: document.id,
            index: document.index,
            booleans: document.booleans,
            strings: document.strings,
            enums: document.enums,
            dates: document.dates,
            doubles: document.doubles,
            int64s: document.int64s,
            int32s: document.int32s,
            geo_points: document.geo_points,
            relations: document.relations,
            suggestions: document.suggestions,
            hh: document.hh,
            hm: document.hm,
            created: document.created,
        }
    }

    /// Copies one typed sequence, preserving order and resolving repeated names.
    fn copy<T: Named + Clone>(
        &self,
        id: &str,
        kind: FieldKind,
        items: &[T],
    ) -> Result<Vec<T>, ProjectionError> {
        let mut out: Vec<T> = Vec::with_capacity(items.len());
        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(items.len());

        for item in items {
            match positions.get(item.name()) {
                Some(&position) => match self.duplicates {
                    DuplicatePolicy::LastWriteWins => out[position] = item.clone(),
                    DuplicatePolicy::Reject => {
                        return Err(ProjectionError::DuplicateAttribute {
                            id: id.to_string(),
                            kind,
                            name: item.name().to_string(),
                        });
                    }
                },
                None => {
                    positions.insert(item.name(), out.len());
                    out.push(item.clone());
                }
            }
        }

        Ok(out)
    }
}

fn ensure_finite<V>(
    id: &str,
    kind: FieldKind,
    items: &[Property<V>],
    finite: impl Fn(&V) -> bool,
) -> Result<(), ProjectionError> {
    match items.iter().find(|p| !finite(&p.value)) {
        Some(p) => Err(ProjectionError::NonFiniteNumber {
            id: id.to_string(),
            kind,
            name: p.name.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::{GeoPoint, RelatedId};

    fn full_entity() -> Entity {
        Entity::new("e-1", "parcel")
            .with_bool("active", true)
            .with_str("status", "open")
            .with_enum("kind", "orchard")
            .with_date("planted", Utc.with_ymd_and_hms(2020, 5, 1, 12, 0, 0).unwrap())
            .with_double("area", 12.5)
            .with_int64("serial", 9_000_000_000)
            .with_int32("rows", 40)
            .with_geo("center", GeoPoint::new(-34.1, -70.7))
            .with_related("farm", "farm-3")
            .with_suggestion("label", "North orchard")
            .with_hashes("hh-1", "hm-1")
    }

    #[test]
    fn test_roundtrip_full_entity() {
        let projector = Projector::default();
        let entity = full_entity();
        let document = projector.to_document(&entity).unwrap();
        assert_eq!(projector.from_document(document), entity);
    }

    #[test]
    fn test_cross_kind_names_coexist() {
        let projector = Projector::new(DuplicatePolicy::Reject);
        let entity = Entity::new("e-1", "parcel")
            .with_bool("status", true)
            .with_str("status", "open");
        let document = projector.to_document(&entity).unwrap();
        assert_eq!(document.booleans[0].name, "status");
        assert_eq!(document.strings[0].name, "status");
    }

    #[test]
    fn test_duplicate_last_write_wins() {
        let projector = Projector::new(DuplicatePolicy::LastWriteWins);
        let mut entity = Entity::new("e-1", "parcel");
        entity.strings = vec![
            Property::new("a", "1".to_string()),
            Property::new("b", "2".to_string()),
            Property::new("a", "3".to_string()),
        ];

        let document = projector.to_document(&entity).unwrap();
        assert_eq!(
            document.strings,
            vec![
                Property::new("a", "3".to_string()),
                Property::new("b", "2".to_string())
            ]
        );
    }

    #[test]
    fn test_duplicate_reject() {
        let projector = Projector::new(DuplicatePolicy::Reject);
        let mut entity = Entity::new("e-1", "parcel");
        entity.relations = vec![RelatedId::new("farm", "f-1"), RelatedId::new("farm", "f-2")];

        let err = projector.to_document(&entity).unwrap_err();
        assert_eq!(
            err,
            ProjectionError::DuplicateAttribute {
                id: "e-1".to_string(),
                kind: FieldKind::Related,
                name: "farm".to_string(),
            }
        );
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let projector = Projector::default();

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let entity = Entity::new("e-1", "parcel")
                .with_double("area", 1.0)
                .with_double("yield", value);
            let err = projector.to_document(&entity).unwrap_err();
            assert_eq!(
                err,
                ProjectionError::NonFiniteNumber {
                    id: "e-1".to_string(),
                    kind: FieldKind::Double,
                    name: "yield".to_string(),
                }
            );
        }

        let entity = Entity::new("e-1", "parcel").with_geo("center", GeoPoint::new(f64::NAN, 0.0));
        assert!(matches!(
            projector.to_document(&entity),
            Err(ProjectionError::NonFiniteNumber { kind: FieldKind::GeoPoint, .. })
        ));
    }

    #[test]
    fn test_entity_is_not_mutated() {
        let projector = Projector::default();
        let mut entity = Entity::new("e-1", "parcel");
        entity.int32s = vec![Property::new("x", 1), Property::new("x", 2)];
        let before = entity.clone();

        let _ = projector.to_document(&entity).unwrap();
        assert_eq!(entity, before);
    }
}
