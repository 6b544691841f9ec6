//! Client configuration.

use serde::{Deserialize, Serialize};

/// How to resolve an attribute name that appears twice in one typed sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the last value, at the position of the first occurrence.
    #[default]
    LastWriteWins,
    /// Refuse to project the entity.
    Reject,
}

/// What to do when an existing index was declared by another schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaDriftPolicy {
    /// Use the index as is.
    Ignore,
    /// Log a warning and use the index as is.
    #[default]
    Warn,
    /// Fail with a schema mismatch error.
    Reject,
}

/// Configuration for an [`EntitySearchClient`](crate::EntitySearchClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// The index the client operates on.
    pub index_name: String,

    /// Maximum number of actions per batch request (default: 1000).
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Duplicate attribute name handling (default: last write wins).
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Schema version drift handling (default: warn).
    #[serde(default)]
    pub schema_drift: SchemaDriftPolicy,
}

fn default_max_batch_size() -> usize {
    1000
}

impl ClientConfig {
    /// Creates a configuration for the given index with default settings.
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            max_batch_size: default_max_batch_size(),
            duplicate_policy: DuplicatePolicy::default(),
            schema_drift: SchemaDriftPolicy::default(),
        }
    }

    /// Sets the maximum batch size. Zero is treated as one.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    /// Sets the duplicate attribute policy.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Sets the schema drift policy.
    pub fn with_schema_drift(mut self, policy: SchemaDriftPolicy) -> Self {
        self.schema_drift = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new("entities");
        assert_eq!(config.index_name, "entities");
        assert_eq!(config.max_batch_size, 1000);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::LastWriteWins);
        assert_eq!(config.schema_drift, SchemaDriftPolicy::Warn);
    }

    #[test]
    fn test_config_deserialization() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"index_name": "entities", "duplicate_policy": "reject", "schema_drift": "ignore"}"#,
        )
        .unwrap();
        assert_eq!(config.max_batch_size, 1000);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.schema_drift, SchemaDriftPolicy::Ignore);
    }

    #[test]
    fn test_zero_batch_size() {
        let config = ClientConfig::new("entities").with_max_batch_size(0);
        assert_eq!(config.max_batch_size, 1);
    }
}
