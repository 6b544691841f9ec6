//! Batch mutations.
//!
//! Documents are turned into keyed [`BatchAction`]s and submitted in chunks
//! of at most `max_batch_size` actions, one request per chunk. Every
//! rejected action is reported by key in a [`BatchError::PartialFailure`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::{ActionOutcome, BatchAction, SearchService};
use crate::error::{BatchError, DocumentFailure, EntitySearchResult};
use crate::schema::SearchDocument;

/// The operation applied to every document of a call to
/// [`BatchMutationEngine::apply_operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Insert or fully replace by key.
    Upsert,
    /// Delete by key.
    Delete,
}

impl Operation {
    /// Turns a document into the action this operation performs on it.
    pub fn action(self, document: SearchDocument) -> BatchAction {
        match self {
            Operation::Upsert => BatchAction::Upsert(document),
            Operation::Delete => BatchAction::Delete { id: document.id },
        }
    }
}

/// Submits keyed upserts and deletes to one index.
#[derive(Debug, Clone)]
pub struct BatchMutationEngine {
    service: Arc<dyn SearchService>,
    index: String,
    max_batch_size: usize,
}

impl BatchMutationEngine {
    /// Creates an engine for an index.
    pub fn new(service: Arc<dyn SearchService>, index: impl Into<String>, max_batch_size: usize) -> Self {
        Self {
            service,
            index: index.into(),
            max_batch_size: max_batch_size.max(1),
        }
    }

    /// Applies one operation to every document.
    pub async fn apply_operation(
        &self,
        documents: Vec<SearchDocument>,
        operation: Operation,
    ) -> EntitySearchResult<Vec<ActionOutcome>> {
        let actions = documents.into_iter().map(|d| operation.action(d)).collect();
        self.apply(actions).await
    }

    /// Submits actions and returns their outcomes in submission order.
    ///
    /// Fails with [`BatchError::PartialFailure`] if any action was rejected;
    /// the other actions are applied regardless. A transport failure aborts
    /// the call, leaving chunks submitted before it committed.
    pub async fn apply(&self, actions: Vec<BatchAction>) -> EntitySearchResult<Vec<ActionOutcome>> {
        let total = actions.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut remaining = actions.into_iter().peekable();
        let mut chunk_index = 0;

        while remaining.peek().is_some() {
            let chunk: Vec<BatchAction> = remaining.by_ref().take(self.max_batch_size).collect();
            debug!(
                index = %self.index,
                chunk = chunk_index,
                actions = chunk.len(),
                "submitting batch"
            );

            match self.service.submit_batch(&self.index, chunk).await {
                Ok(chunk_outcomes) => outcomes.extend(chunk_outcomes),
                Err(e) => {
                    if chunk_index > 0 {
                        warn!(
                            index = %self.index,
                            committed = outcomes.len(),
                            total,
                            error = %e,
                            "batch aborted after earlier chunks were committed"
                        );
                    }
                    return Err(e.into());
                }
            }
            chunk_index += 1;
        }

        let failures: Vec<DocumentFailure> = outcomes
            .iter()
            .filter_map(|o| {
                o.error.as_ref().map(|message| DocumentFailure {
                    id: o.id.clone(),
                    action: o.kind,
                    status: o.status,
                    message: message.clone(),
                })
            })
            .collect();

        if failures.is_empty() {
            return Ok(outcomes);
        }

        warn!(
            index = %self.index,
            failed = failures.len(),
            total,
            "batch actions rejected"
        );
        Err(BatchError::PartialFailure {
            succeeded: outcomes.len() - failures.len(),
            failures,
        }
        .into())
    }
}
