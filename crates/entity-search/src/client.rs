//! The client bound to one logical index.

use std::sync::Arc;

use tracing::info;

use crate::config::ClientConfig;
use crate::core::{ActionOutcome, BatchAction, SearchService};
use crate::engine::{
    BatchMutationEngine, EnsureOutcome, IndexLifecycleManager, Operation, QueryEngine,
};
use crate::error::{EntitySearchResult, TransportError};
use crate::projection::Projector;
use crate::types::Entity;

/// Indexes, queries and deletes attribute-bag entities in one search index.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use entity_search::backends::memory::{MemoryConfig, MemorySearchService};
/// use entity_search::types::Entity;
/// use entity_search::{ClientConfig, EntitySearchClient};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let service = Arc::new(MemorySearchService::new(MemoryConfig::default()).unwrap());
/// let client = EntitySearchClient::connect(service, ClientConfig::new("entities"))
///     .await
///     .unwrap();
///
/// client
///     .add_element(&Entity::new("a", "order").with_str("city", "X"))
///     .await
///     .unwrap();
///
/// let found = client
///     .filter_elements("str/any(s: s/name eq 'city' and s/value eq 'X')")
///     .await
///     .unwrap();
/// assert_eq!(found.len(), 1);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct EntitySearchClient {
    config: ClientConfig,
    service: Arc<dyn SearchService>,
    projector: Projector,
    lifecycle: IndexLifecycleManager,
    batch: BatchMutationEngine,
    query: QueryEngine,
}

impl EntitySearchClient {
    /// Creates a client and makes sure its index exists.
    pub async fn connect(
        service: Arc<dyn SearchService>,
        config: ClientConfig,
    ) -> EntitySearchResult<Self> {
        let client = Self::new(service, config);
        let outcome = client.lifecycle.ensure_index(&client.config.index_name).await?;
        info!(
            index = %client.config.index_name,
            service = client.service.name(),
            created = outcome == EnsureOutcome::Created,
            "entity search client connected"
        );
        Ok(client)
    }

    /// Creates a client without touching the service.
    pub fn new(service: Arc<dyn SearchService>, config: ClientConfig) -> Self {
        let projector = Projector::new(config.duplicate_policy);
        let lifecycle = IndexLifecycleManager::new(service.clone(), config.schema_drift);
        let batch = BatchMutationEngine::new(
            service.clone(),
            config.index_name.clone(),
            config.max_batch_size,
        );
        let query = QueryEngine::new(
            service.clone(),
            config.index_name.clone(),
            projector,
            batch.clone(),
            lifecycle.clone(),
        );

        Self {
            config,
            service,
            projector,
            lifecycle,
            batch,
            query,
        }
    }

    /// Returns the name of the index the client operates on.
    pub fn index_name(&self) -> &str {
        &self.config.index_name
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Inserts an entity, or replaces the indexed entity with the same id.
    pub async fn add_element(&self, entity: &Entity) -> EntitySearchResult<ActionOutcome> {
        let mut outcomes = self.add_elements(std::slice::from_ref(entity)).await?;
        outcomes.pop().ok_or_else(|| {
            TransportError::Internal {
                service: self.service.name().to_string(),
                message: format!("no outcome reported for entity {}", entity.id),
                source: None,
            }
            .into()
        })
    }

    /// Inserts or replaces entities.
    pub async fn add_elements(&self, entities: &[Entity]) -> EntitySearchResult<Vec<ActionOutcome>> {
        let documents = self.projector.to_documents(entities)?;
        self.batch.apply_operation(documents, Operation::Upsert).await
    }

    /// Deletes an entity by id. Deleting an entity that is not indexed succeeds.
    pub async fn delete_element(&self, entity: &Entity) -> EntitySearchResult<()> {
        self.delete_ids([entity.id.as_str()]).await
    }

    /// Deletes entities by id.
    pub async fn delete_elements(&self, entities: &[Entity]) -> EntitySearchResult<()> {
        self.delete_ids(entities.iter().map(|e| e.id.as_str())).await
    }

    /// Deletes documents by key.
    pub async fn delete_ids<I, S>(&self, ids: I) -> EntitySearchResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let actions: Vec<BatchAction> = ids.into_iter().map(BatchAction::delete).collect();
        self.batch.apply(actions).await?;
        Ok(())
    }

    /// Returns every entity matching a filter expression.
    pub async fn filter_elements(&self, expression: &str) -> EntitySearchResult<Vec<Entity>> {
        self.query.filter(expression).await
    }

    /// Deletes every entity matching a filter expression and returns the
    /// number deleted. Not atomic with respect to concurrent writers.
    pub async fn delete_by_filter(&self, expression: &str) -> EntitySearchResult<usize> {
        self.query.delete_by_filter(expression).await
    }

    /// Removes every entity by recreating the index.
    pub async fn empty_index(&self) -> EntitySearchResult<()> {
        self.query.empty_index().await
    }

    /// Declares the index, updating the definition of an existing one.
    pub async fn create_or_update_index(&self) -> EntitySearchResult<()> {
        self.lifecycle
            .create_or_update_index(&self.config.index_name)
            .await
    }

    /// Deletes and recreates the index. Every indexed entity is lost.
    pub async fn recreate_index(&self) -> EntitySearchResult<()> {
        self.lifecycle.recreate_index(&self.config.index_name).await
    }
}
