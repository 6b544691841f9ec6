//! Entity fixtures used across the integration tests.

use chrono::{TimeZone, Utc};

use entity_search::types::{Entity, GeoPoint};

/// An order with one attribute of every kind.
pub fn full_order(id: &str) -> Entity {
    Entity::new(id, "order")
        .with_created(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        .with_hashes("hh-1", "hm-1")
        .with_bool("paid", true)
        .with_str("city", "X")
        .with_str("status", "open")
        .with_enum("channel", "web")
        .with_date("due", Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap())
        .with_double("total", 99.5)
        .with_int64("sequence", 9_000_000_000)
        .with_int32("lines", 3)
        .with_geo("ship_to", GeoPoint::new(52.37, 4.89))
        .with_related("customer", "c-1")
        .with_suggestion("title", "Blue widget order")
}

/// A minimal entity with a single string attribute.
pub fn city_entity(id: &str, city: &str) -> Entity {
    Entity::new(id, "order").with_str("city", city)
}

/// `count` entities with zero-padded ids so key order matches creation order.
pub fn numbered(count: usize) -> Vec<Entity> {
    (0..count)
        .map(|i| Entity::new(format!("e{:04}", i), "item").with_int32("n", i as i32))
        .collect()
}
