//! The engines driving the search service: index lifecycle, batch
//! mutations and queries.

mod batch;
mod lifecycle;
mod query;

pub use batch::{BatchMutationEngine, Operation};
pub use lifecycle::{EnsureOutcome, IndexLifecycleManager};
pub use query::QueryEngine;
