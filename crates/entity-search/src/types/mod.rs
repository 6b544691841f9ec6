//! Caller-facing types.
//!
//! - [`Entity`] - the attribute-bag entity
//! - [`Property`], [`RelatedId`], [`GeoPoint`] - named attribute values
//! - [`PageToken`], [`SearchPage`] - paging through search results

mod entity;
mod pagination;
mod property;

pub use entity::Entity;
pub use pagination::{PageToken, SearchPage};
pub use property::{GeoPoint, Property, RelatedId};

pub(crate) use property::Named;
