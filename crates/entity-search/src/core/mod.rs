//! Core abstractions shared by the engines and the backends.

mod service;

pub use service::{ActionKind, ActionOutcome, BatchAction, IndexProbe, SearchService};
