//! Entity Search
//!
//! This crate indexes attribute-bag entities in a remote document-search
//! service and queries them back with boolean filter expressions.
//!
//! Entities carry open-ended attributes: arbitrary named values of ten
//! primitive kinds. The search index has a fixed schema, so every attribute
//! kind is stored as an ordered sequence of `{name, value}` elements in a
//! [`SearchDocument`](schema::SearchDocument) whose field set never changes.
//!
//! # Features
//!
//! - **Projection**: lossless mapping between [`Entity`](types::Entity) and
//!   the fixed document schema
//! - **Index lifecycle**: create-if-absent with schema version checks, and
//!   destructive recreation
//! - **Batch mutations**: keyed upserts and idempotent deletes with
//!   per-document failure reporting
//! - **Queries**: filter expressions with pagination exhausted internally,
//!   and delete-by-filter
//!
//! Backend features:
//! - in-memory backend, always available
//! - `elasticsearch` - Elasticsearch backend
//!
//! # Architecture
//!
//! - [`types`] - Entities, attribute elements and page tokens
//! - [`schema`] - The document schema and the index definition derived from it
//! - [`projection`] - Entity to document projection
//! - [`filter`] - The filter expression language understood by the backends
//! - [`core`] - The search service trait
//! - [`engine`] - Index lifecycle, batch mutation and query engines
//! - [`backends`] - Search service implementations
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use entity_search::backends::memory::{MemoryConfig, MemorySearchService};
//! use entity_search::types::Entity;
//! use entity_search::{ClientConfig, EntitySearchClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = Arc::new(MemorySearchService::new(MemoryConfig::default())?);
//! let client = EntitySearchClient::connect(service, ClientConfig::new("entities")).await?;
//!
//! client
//!     .add_element(&Entity::new("order-1", "order").with_str("status", "open"))
//!     .await?;
//!
//! let open = client
//!     .filter_elements("str/any(s: s/name eq 'status' and s/value eq 'open')")
//!     .await?;
//! assert_eq!(open.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod client;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod filter;
pub mod projection;
pub mod schema;
pub mod types;

pub use client::EntitySearchClient;
pub use config::{ClientConfig, DuplicatePolicy, SchemaDriftPolicy};
pub use core::{ActionKind, ActionOutcome, BatchAction, IndexProbe, SearchService};
pub use error::{EntitySearchError, EntitySearchResult, ErrorKind};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
