//! The attribute-bag entity.
//!
//! An [`Entity`] carries an open-ended set of named attributes grouped by
//! primitive kind. Within one kind an attribute name appears at most once;
//! the same name may appear under different kinds.

use chrono::{DateTime, Utc};

use super::property::{GeoPoint, Property, RelatedId, upsert};

/// A business entity whose attributes are not known at schema-design time.
///
/// # Example
///
/// ```
/// use entity_search::types::Entity;
///
/// let entity = Entity::new("order-1", "order")
///     .with_str("city", "Santiago")
///     .with_bool("paid", true)
///     .with_int32("items", 3)
///     .with_related("customer", "customer-7");
///
/// assert_eq!(entity.strings[0].value, "Santiago");
/// assert_eq!(entity.relations[0].id, "customer-7");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Unique key of the entity.
    pub id: String,
    /// Discriminator naming the logical entity type.
    pub index: String,
    /// Boolean attributes.
    pub booleans: Vec<Property<bool>>,
    /// String attributes.
    pub strings: Vec<Property<String>>,
    /// Enumeration attributes, stored by their string form.
    pub enums: Vec<Property<String>>,
    /// Datetime attributes.
    pub dates: Vec<Property<DateTime<Utc>>>,
    /// Double attributes.
    pub doubles: Vec<Property<f64>>,
    /// 64-bit integer attributes.
    pub int64s: Vec<Property<i64>>,
    /// 32-bit integer attributes.
    pub int32s: Vec<Property<i32>>,
    /// Geo-point attributes.
    pub geo_points: Vec<Property<GeoPoint>>,
    /// References to related entities.
    pub relations: Vec<RelatedId>,
    /// Suggestion text feeding autocomplete.
    pub suggestions: Vec<Property<String>>,
    /// Opaque change-detection hash.
    pub hh: Option<String>,
    /// Opaque change-detection hash.
    pub hm: Option<String>,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Entity {
    /// Creates an entity with no attributes, stamped with the current time.
    pub fn new(id: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index: index.into(),
            booleans: Vec::new(),
            strings: Vec::new(),
            enums: Vec::new(),
            dates: Vec::new(),
            doubles: Vec::new(),
            int64s: Vec::new(),
            int32s: Vec::new(),
            geo_points: Vec::new(),
            relations: Vec::new(),
            suggestions: Vec::new(),
            hh: None,
            hm: None,
            created: Utc::now(),
        }
    }

    /// Sets a boolean attribute.
    pub fn with_bool(mut self, name: impl Into<String>, value: bool) -> Self {
        upsert(&mut self.booleans, Property::new(name, value));
        self
    }

    /// Sets a string attribute.
    pub fn with_str(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(&mut self.strings, Property::new(name, value.into()));
        self
    }

    /// Sets an enumeration attribute.
    pub fn with_enum(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(&mut self.enums, Property::new(name, value.into()));
        self
    }

    /// Sets a datetime attribute.
    pub fn with_date(mut self, name: impl Into<String>, value: DateTime<Utc>) -> Self {
        upsert(&mut self.dates, Property::new(name, value));
        self
    }

    /// Sets a double attribute.
    pub fn with_double(mut self, name: impl Into<String>, value: f64) -> Self {
        upsert(&mut self.doubles, Property::new(name, value));
        self
    }

    /// Sets a 64-bit integer attribute.
    pub fn with_int64(mut self, name: impl Into<String>, value: i64) -> Self {
        upsert(&mut self.int64s, Property::new(name, value));
        self
    }

    /// Sets a 32-bit integer attribute.
    pub fn with_int32(mut self, name: impl Into<String>, value: i32) -> Self {
        upsert(&mut self.int32s, Property::new(name, value));
        self
    }

    /// Sets a geo-point attribute.
    pub fn with_geo(mut self, name: impl Into<String>, value: GeoPoint) -> Self {
        upsert(&mut self.geo_points, Property::new(name, value));
        self
    }

    /// Sets a reference to a related entity.
    pub fn with_related(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        upsert(&mut self.relations, RelatedId::new(name, id));
        self
    }

    /// Sets a suggestion text.
    pub fn with_suggestion(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        upsert(&mut self.suggestions, Property::new(name, text.into()));
        self
    }

    /// Sets both change-detection hashes.
    pub fn with_hashes(mut self, hh: impl Into<String>, hm: impl Into<String>) -> Self {
        self.hh = Some(hh.into());
        self.hm = Some(hm.into());
        self
    }

    /// Overrides the creation timestamp.
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// Returns the value of a string attribute.
    pub fn str_value(&self, name: &str) -> Option<&str> {
        self.strings
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}
