//! Filter queries, delete-by-filter and index reset.

use std::sync::Arc;

use tracing::{debug, info};

use crate::core::{BatchAction, SearchService};
use crate::error::{EntitySearchResult, TransportError};
use crate::projection::Projector;
use crate::schema::SearchDocument;
use crate::types::Entity;

use super::batch::BatchMutationEngine;
use super::lifecycle::IndexLifecycleManager;

/// Runs filter expressions against one index.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    service: Arc<dyn SearchService>,
    index: String,
    projector: Projector,
    batch: BatchMutationEngine,
    lifecycle: IndexLifecycleManager,
}

impl QueryEngine {
    /// Creates a query engine that deletes through `batch` and resets the
    /// index through `lifecycle`.
    pub fn new(
        service: Arc<dyn SearchService>,
        index: impl Into<String>,
        projector: Projector,
        batch: BatchMutationEngine,
        lifecycle: IndexLifecycleManager,
    ) -> Self {
        Self {
            service,
            index: index.into(),
            projector,
            batch,
            lifecycle,
        }
    }

    /// Returns every entity matching the filter expression.
    ///
    /// All result pages are fetched before returning.
    pub async fn filter(&self, expression: &str) -> EntitySearchResult<Vec<Entity>> {
        let documents = self.filter_documents(expression).await?;
        Ok(documents
            .into_iter()
            .map(|d| self.projector.from_document(d))
            .collect())
    }

    /// Returns every document matching the filter expression, in key order.
    pub async fn filter_documents(&self, expression: &str) -> EntitySearchResult<Vec<SearchDocument>> {
        let mut documents = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .service
                .search(&self.index, expression, token.as_deref())
                .await?;
            pages += 1;
            debug!(
                index = %self.index,
                page = pages,
                documents = page.documents.len(),
                "fetched result page"
            );
            documents.extend(page.documents);

            match page.next_token {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    return Err(TransportError::Internal {
                        service: self.service.name().to_string(),
                        message: "search returned the same page token twice".to_string(),
                        source: None,
                    }
                    .into());
                }
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(documents)
    }

    /// Deletes every document matching the filter expression and returns
    /// how many were deleted.
    ///
    /// The matching keys are read first and deleted in a second step.
    /// Documents written between the two steps are not covered.
    pub async fn delete_by_filter(&self, expression: &str) -> EntitySearchResult<usize> {
        let documents = self.filter_documents(expression).await?;
        if documents.is_empty() {
            debug!(index = %self.index, "delete by filter matched nothing");
            return Ok(0);
        }

        let actions: Vec<BatchAction> = documents
            .into_iter()
            .map(|d| BatchAction::Delete { id: d.id })
            .collect();
        let count = actions.len();
        self.batch.apply(actions).await?;

        info!(index = %self.index, deleted = count, "deleted documents by filter");
        Ok(count)
    }

    /// Removes every document by deleting and recreating the index.
    pub async fn empty_index(&self) -> EntitySearchResult<()> {
        self.lifecycle.recreate_index(&self.index).await
    }
}
