//! Service harness: in-memory services and a recording wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use entity_search::backends::memory::{MemoryConfig, MemorySearchService};
use entity_search::core::{ActionOutcome, BatchAction, IndexProbe, SearchService};
use entity_search::error::TransportError;
use entity_search::schema::IndexDefinition;
use entity_search::types::SearchPage;
use entity_search::{ClientConfig, EntitySearchClient};

pub const INDEX: &str = "entities";

/// Creates an in-memory service with the given page size.
pub fn memory_service(page_size: usize) -> Arc<MemorySearchService> {
    Arc::new(
        MemorySearchService::new(MemoryConfig::default().with_page_size(page_size))
            .expect("default key pattern is valid"),
    )
}

/// Connects a client with default settings to an in-memory service.
pub async fn connect(service: Arc<MemorySearchService>) -> EntitySearchClient {
    EntitySearchClient::connect(service, ClientConfig::new(INDEX))
        .await
        .expect("connect to in-memory service")
}

/// Page token handed out by a service that never advances.
pub const STUCK_TOKEN: &str = "stuck";

/// Wraps a service, recording batch sizes. It can also fail a batch, report
/// a fixed probe result, or hand out a page token that never advances.
#[derive(Debug)]
pub struct RecordingService {
    inner: Arc<MemorySearchService>,
    batch_sizes: Mutex<Vec<usize>>,
    fail_on_batch: Option<usize>,
    probe: Option<IndexProbe>,
    stuck_paging: bool,
}

impl RecordingService {
    pub fn new(inner: Arc<MemorySearchService>) -> Self {
        Self {
            inner,
            batch_sizes: Mutex::new(Vec::new()),
            fail_on_batch: None,
            probe: None,
            stuck_paging: false,
        }
    }

    /// Answers every existence probe with `probe`.
    pub fn reporting_probe(mut self, probe: IndexProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Serves the first result page for every request, always followed by
    /// [`STUCK_TOKEN`].
    pub fn with_stuck_paging(mut self) -> Self {
        self.stuck_paging = true;
        self
    }

    /// Makes the n-th submitted batch (zero-based) fail with a throttling error.
    pub fn failing_on_batch(mut self, n: usize) -> Self {
        self.fail_on_batch = Some(n);
        self
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().clone()
    }
}

#[async_trait]
impl SearchService for RecordingService {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn probe_index(&self, name: &str) -> Result<IndexProbe, TransportError> {
        if let Some(probe) = self.probe {
            return Ok(probe);
        }
        self.inner.probe_index(name).await
    }

    async fn create_or_update_index(
        &self,
        definition: &IndexDefinition,
    ) -> Result<(), TransportError> {
        self.inner.create_or_update_index(definition).await
    }

    async fn delete_index(&self, name: &str) -> Result<(), TransportError> {
        self.inner.delete_index(name).await
    }

    async fn submit_batch(
        &self,
        index: &str,
        actions: Vec<BatchAction>,
    ) -> Result<Vec<ActionOutcome>, TransportError> {
        let batch = {
            let mut sizes = self.batch_sizes.lock();
            sizes.push(actions.len());
            sizes.len() - 1
        };
        if self.fail_on_batch == Some(batch) {
            return Err(TransportError::Throttled {
                service: self.name().to_string(),
                message: "quota exhausted".to_string(),
            });
        }
        self.inner.submit_batch(index, actions).await
    }

    async fn search(
        &self,
        index: &str,
        filter: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, TransportError> {
        if self.stuck_paging {
            let page = self.inner.search(index, filter, None).await?;
            return Ok(SearchPage::new(page.documents, Some(STUCK_TOKEN.to_string())));
        }
        self.inner.search(index, filter, page_token).await
    }
}
