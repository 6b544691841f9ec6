//! Elasticsearch search service.
//!
//! Enabled with the `elasticsearch` feature.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use entity_search::backends::elasticsearch::{ElasticsearchConfig, ElasticsearchSearchService};
//! use entity_search::{ClientConfig, EntitySearchClient};
//!
//! let config = ElasticsearchConfig::new("http://localhost:9200");
//! let service = Arc::new(ElasticsearchSearchService::new(config)?);
//! let client = EntitySearchClient::connect(service, ClientConfig::new("entities")).await?;
//! ```

mod backend;
pub mod query;
pub mod schema;
mod service;

pub use backend::{ElasticsearchAuth, ElasticsearchConfig, ElasticsearchSearchService};
pub use service::{bulk_lines, parse_bulk_response, parse_search_response};
