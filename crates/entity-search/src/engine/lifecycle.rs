//! Index lifecycle: existence probing, creation and destructive recreation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SchemaDriftPolicy;
use crate::core::{IndexProbe, SearchService};
use crate::error::{EntitySearchResult, SchemaError, TransportError};
use crate::schema::{IndexDefinition, SCHEMA_VERSION};

/// What [`IndexLifecycleManager::ensure_index`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The index was absent and has been created.
    Created,
    /// The index already existed and was left untouched.
    Existing {
        /// Schema version recorded on the existing index.
        schema_version: Option<u32>,
    },
}

/// Creates and recreates the remote index declared by the document schema.
#[derive(Debug, Clone)]
pub struct IndexLifecycleManager {
    service: Arc<dyn SearchService>,
    drift: SchemaDriftPolicy,
}

impl IndexLifecycleManager {
    /// Creates a manager over a search service.
    pub fn new(service: Arc<dyn SearchService>, drift: SchemaDriftPolicy) -> Self {
        Self { service, drift }
    }

    /// Makes sure the index exists, creating it if the probe reports it absent.
    ///
    /// An existing index is not modified. Its recorded schema version is
    /// checked against [`SCHEMA_VERSION`] according to the drift policy.
    pub async fn ensure_index(&self, name: &str) -> EntitySearchResult<EnsureOutcome> {
        match self.service.probe_index(name).await? {
            IndexProbe::Found { schema_version } => {
                debug!(index = name, ?schema_version, "index exists");
                self.check_drift(name, schema_version)?;
                Ok(EnsureOutcome::Existing { schema_version })
            }
            IndexProbe::NotFound => {
                self.create_or_update_index(name).await?;
                Ok(EnsureOutcome::Created)
            }
        }
    }

    /// Declares the index, creating it or updating its definition in place.
    pub async fn create_or_update_index(&self, name: &str) -> EntitySearchResult<()> {
        let definition = IndexDefinition::for_index(name);
        self.service.create_or_update_index(&definition).await?;
        info!(
            index = name,
            service = self.service.name(),
            schema_version = definition.schema_version,
            "declared search index"
        );
        Ok(())
    }

    /// Deletes the index with all of its documents, then declares it again.
    pub async fn recreate_index(&self, name: &str) -> EntitySearchResult<()> {
        match self.service.delete_index(name).await {
            Ok(()) => info!(index = name, "deleted search index"),
            Err(TransportError::NotFound { .. }) => {
                debug!(index = name, "index to delete does not exist")
            }
            Err(e) => return Err(e.into()),
        }
        self.ensure_index(name).await?;
        Ok(())
    }

    fn check_drift(&self, name: &str, found: Option<u32>) -> Result<(), SchemaError> {
        if found == Some(SCHEMA_VERSION) {
            return Ok(());
        }

        match self.drift {
            SchemaDriftPolicy::Ignore => Ok(()),
            SchemaDriftPolicy::Warn => {
                warn!(
                    index = name,
                    expected = SCHEMA_VERSION,
                    found = ?found,
                    "search index was declared by a different schema version"
                );
                Ok(())
            }
            SchemaDriftPolicy::Reject => Err(SchemaError::Mismatch {
                index: name.to_string(),
                expected: SCHEMA_VERSION,
                found,
            }),
        }
    }
}
