//! Named attribute value records.
//!
//! Every typed attribute sequence, on both the entity and the document side,
//! is a list of these small records: an attribute name plus one value.

use serde::{Deserialize, Serialize};

/// A named attribute value of type `V`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property<V> {
    /// The attribute name, unique within its typed sequence.
    pub name: String,
    /// The attribute value.
    pub value: V,
}

impl<V> Property<V> {
    /// Creates a new named value.
    pub fn new(name: impl Into<String>, value: V) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A named reference to another entity by its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelatedId {
    /// The relation name.
    pub name: String,
    /// The identifier of the referenced entity.
    pub id: String,
}

impl RelatedId {
    /// Creates a new relation.
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a coordinate from latitude and longitude.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Types that carry an attribute name.
pub(crate) trait Named {
    fn name(&self) -> &str;
}

impl<V> Named for Property<V> {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for RelatedId {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Replaces the value of an existing same-name attribute, or appends it.
pub(crate) fn upsert<T: Named>(items: &mut Vec<T>, item: T) {
    match items.iter_mut().find(|existing| existing.name() == item.name()) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}
