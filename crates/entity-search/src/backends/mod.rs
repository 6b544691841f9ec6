//! Search service implementations.

pub mod memory;

#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;
