//! The search service abstraction.
//!
//! A [`SearchService`] is the remote document-search collaborator. The
//! engines in this crate only ever talk to it through these primitives, so
//! any service that can probe, declare and delete an index, apply a batch of
//! keyed upserts and deletes, and page through a filtered result set can
//! back an [`EntitySearchClient`](crate::EntitySearchClient).

use std::fmt;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::schema::{IndexDefinition, SearchDocument};
use crate::types::SearchPage;

/// Outcome of probing for an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexProbe {
    /// The index exists. Carries the schema version recorded at creation,
    /// if the service stored one.
    Found {
        /// Recorded document schema version.
        schema_version: Option<u32>,
    },
    /// No index with that name exists.
    NotFound,
}

/// The kind of a batch action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Insert or fully replace by key.
    Upsert,
    /// Delete by key.
    Delete,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Upsert => write!(f, "upsert"),
            ActionKind::Delete => write!(f, "delete"),
        }
    }
}

/// One action of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchAction {
    /// Insert the document, or overwrite every field of the one with the same key.
    Upsert(SearchDocument),
    /// Delete the document with this key. Deleting a missing key succeeds.
    Delete {
        /// The document key.
        id: String,
    },
}

impl BatchAction {
    /// Creates a delete action.
    pub fn delete(id: impl Into<String>) -> Self {
        BatchAction::Delete { id: id.into() }
    }

    /// Returns the key the action applies to.
    pub fn id(&self) -> &str {
        match self {
            BatchAction::Upsert(document) => &document.id,
            BatchAction::Delete { id } => id,
        }
    }

    /// Returns the action kind.
    pub fn kind(&self) -> ActionKind {
        match self {
            BatchAction::Upsert(_) => ActionKind::Upsert,
            BatchAction::Delete { .. } => ActionKind::Delete,
        }
    }
}

/// Per-action result reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// The document key.
    pub id: String,
    /// The action kind.
    pub kind: ActionKind,
    /// Status code reported for the action.
    pub status: u16,
    /// Error message when the action was rejected.
    pub error: Option<String>,
}

impl ActionOutcome {
    /// A successful outcome.
    pub fn success(id: impl Into<String>, kind: ActionKind, status: u16) -> Self {
        Self {
            id: id.into(),
            kind,
            status,
            error: None,
        }
    }

    /// A rejected outcome.
    pub fn failure(
        id: impl Into<String>,
        kind: ActionKind,
        status: u16,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            status,
            error: Some(error.into()),
        }
    }

    /// Returns true if the action was applied.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Primitives a remote document-search service must provide.
///
/// Implementations never retry; any failure other than the expected
/// [`IndexProbe::NotFound`] is returned as a [`TransportError`].
#[async_trait]
pub trait SearchService: Send + Sync + fmt::Debug {
    /// Short name of the service, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Checks whether an index exists.
    async fn probe_index(&self, name: &str) -> Result<IndexProbe, TransportError>;

    /// Creates the index, or updates it in place if it already exists.
    async fn create_or_update_index(&self, definition: &IndexDefinition)
    -> Result<(), TransportError>;

    /// Deletes an index and every document in it.
    async fn delete_index(&self, name: &str) -> Result<(), TransportError>;

    /// Submits a batch of actions as a single request.
    ///
    /// Returns one outcome per action, in submission order.
    async fn submit_batch(
        &self,
        index: &str,
        actions: Vec<BatchAction>,
    ) -> Result<Vec<ActionOutcome>, TransportError>;

    /// Returns one page of documents matching a filter expression.
    ///
    /// Pages are ordered by document key. Pass the previous page's
    /// `next_token` to continue.
    async fn search(
        &self,
        index: &str,
        filter: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, TransportError>;
}
