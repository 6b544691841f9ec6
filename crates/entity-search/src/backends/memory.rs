//! An in-process search service.
//!
//! Documents are held as serialized JSON in a `BTreeMap` keyed by document
//! key, so results come out in key order and pages resume after the last
//! key of the previous page. Useful for tests and for running the engines
//! without a remote cluster.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::core::{ActionKind, ActionOutcome, BatchAction, IndexProbe, SearchService};
use crate::error::TransportError;
use crate::filter::Filter;
use crate::schema::{IndexDefinition, SearchDocument};
use crate::types::{PageToken, SearchPage};

const SERVICE_NAME: &str = "memory";

/// Configuration for [`MemorySearchService`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum number of documents per result page (default: 50).
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Pattern every document key must match.
    #[serde(default = "default_key_pattern")]
    pub key_pattern: String,
}

fn default_page_size() -> usize {
    50
}

fn default_key_pattern() -> String {
    "^[A-Za-z0-9_=-]+$".to_string()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            key_pattern: default_key_pattern(),
        }
    }
}

impl MemoryConfig {
    /// Sets the page size. Zero is treated as one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[derive(Debug)]
struct MemoryIndex {
    definition: IndexDefinition,
    documents: BTreeMap<String, Value>,
}

/// A [`SearchService`] keeping every index in memory.
#[derive(Debug)]
pub struct MemorySearchService {
    config: MemoryConfig,
    key_pattern: Regex,
    indexes: RwLock<HashMap<String, MemoryIndex>>,
    create_calls: AtomicUsize,
}

impl MemorySearchService {
    /// Creates an empty service.
    pub fn new(config: MemoryConfig) -> Result<Self, regex::Error> {
        let key_pattern = Regex::new(&config.key_pattern)?;
        Ok(Self {
            config,
            key_pattern,
            indexes: RwLock::new(HashMap::new()),
            create_calls: AtomicUsize::new(0),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Returns the names of all indexes, sorted.
    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the definition an index was last declared with.
    pub fn definition(&self, index: &str) -> Option<IndexDefinition> {
        self.indexes
            .read()
            .get(index)
            .map(|i| i.definition.clone())
    }

    /// Returns the number of documents in an index.
    pub fn document_count(&self, index: &str) -> Option<usize> {
        self.indexes.read().get(index).map(|i| i.documents.len())
    }

    /// Returns how many times an index was created or updated.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn apply(&self, index: &mut MemoryIndex, action: BatchAction) -> ActionOutcome {
        let kind = action.kind();
        if !self.key_pattern.is_match(action.id()) {
            return ActionOutcome::failure(
                action.id(),
                kind,
                400,
                format!("invalid document key '{}'", action.id()),
            );
        }

        match action {
            BatchAction::Upsert(document) => match serde_json::to_value(&document) {
                Ok(value) => match index.documents.insert(document.id.clone(), value) {
                    Some(_) => ActionOutcome::success(document.id, kind, 200),
                    None => ActionOutcome::success(document.id, kind, 201),
                },
                Err(e) => ActionOutcome::failure(document.id, kind, 400, e.to_string()),
            },
            BatchAction::Delete { id } => match index.documents.remove(&id) {
                Some(_) => ActionOutcome::success(id, ActionKind::Delete, 200),
                None => ActionOutcome::success(id, ActionKind::Delete, 404),
            },
        }
    }
}

fn not_found(index: &str) -> TransportError {
    TransportError::NotFound {
        index: index.to_string(),
    }
}

#[async_trait]
impl SearchService for MemorySearchService {
    fn name(&self) -> &'static str {
        SERVICE_NAME
    }

    async fn probe_index(&self, name: &str) -> Result<IndexProbe, TransportError> {
        Ok(match self.indexes.read().get(name) {
            Some(index) => IndexProbe::Found {
                schema_version: Some(index.definition.schema_version),
            },
            None => IndexProbe::NotFound,
        })
    }

    async fn create_or_update_index(
        &self,
        definition: &IndexDefinition,
    ) -> Result<(), TransportError> {
        let mut indexes = self.indexes.write();
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        match indexes.get_mut(&definition.name) {
            Some(index) => {
                index.definition = definition.clone();
                debug!(index = %definition.name, "updated in-memory index");
            }
            None => {
                indexes.insert(
                    definition.name.clone(),
                    MemoryIndex {
                        definition: definition.clone(),
                        documents: BTreeMap::new(),
                    },
                );
                info!(index = %definition.name, "created in-memory index");
            }
        }
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), TransportError> {
        match self.indexes.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(not_found(name)),
        }
    }

    async fn submit_batch(
        &self,
        index: &str,
        actions: Vec<BatchAction>,
    ) -> Result<Vec<ActionOutcome>, TransportError> {
        let mut indexes = self.indexes.write();
        let target = indexes.get_mut(index).ok_or_else(|| not_found(index))?;

        Ok(actions
            .into_iter()
            .map(|action| self.apply(target, action))
            .collect())
    }

    async fn search(
        &self,
        index: &str,
        filter: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, TransportError> {
        let filter = Filter::parse(filter).map_err(|e| e.into_transport(SERVICE_NAME))?;
        let token = page_token.map(PageToken::decode).transpose()?;

        let start = match token.as_ref().and_then(|t| t.last_id()) {
            Some(last) => Bound::Excluded(last.to_string()),
            None => Bound::Unbounded,
        };

        let indexes = self.indexes.read();
        let target = indexes.get(index).ok_or_else(|| not_found(index))?;

        let page_size = self.config.page_size.max(1);
        let mut matched = target
            .documents
            .range((start, Bound::Unbounded))
            .filter(|(_, document)| filter.matches(document))
            .take(page_size + 1)
            .map(|(_, document)| {
                serde_json::from_value::<SearchDocument>(document.clone()).map_err(|e| {
                    TransportError::Serialization {
                        message: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let next_token = if matched.len() > page_size {
            matched.truncate(page_size);
            matched.last().map(|d| PageToken::after_id(&d.id).encode())
        } else {
            None
        };

        Ok(SearchPage::new(matched, next_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn service(page_size: usize) -> MemorySearchService {
        MemorySearchService::new(MemoryConfig::default().with_page_size(page_size)).unwrap()
    }

    fn document(id: &str) -> SearchDocument {
        SearchDocument {
            id: id.to_string(),
            index: "order".to_string(),
            created: Utc::now(),
            hh: None,
            hm: None,
            booleans: vec![],
            strings: vec![],
            enums: vec![],
            dates: vec![],
            doubles: vec![],
            int64s: vec![],
            int32s: vec![],
            geo_points: vec![],
            relations: vec![],
            suggestions: vec![],
        }
    }

    #[tokio::test]
    async fn test_probe_and_create() {
        let service = service(10);
        assert_eq!(
            service.probe_index("entities").await.unwrap(),
            IndexProbe::NotFound
        );

        service
            .create_or_update_index(&IndexDefinition::for_index("entities"))
            .await
            .unwrap();
        assert!(matches!(
            service.probe_index("entities").await.unwrap(),
            IndexProbe::Found {
                schema_version: Some(_)
            }
        ));
        assert_eq!(service.create_calls(), 1);
        assert_eq!(service.index_names(), vec!["entities".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_index() {
        let service = service(10);
        assert!(matches!(
            service.search("missing", "*", None).await,
            Err(TransportError::NotFound { .. })
        ));
        assert!(matches!(
            service.submit_batch("missing", vec![]).await,
            Err(TransportError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete_index("missing").await,
            Err(TransportError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_batch_outcomes() {
        let service = service(10);
        service
            .create_or_update_index(&IndexDefinition::for_index("entities"))
            .await
            .unwrap();

        let outcomes = service
            .submit_batch(
                "entities",
                vec![
                    BatchAction::Upsert(document("a")),
                    BatchAction::Upsert(document("a")),
                    BatchAction::Upsert(document("not valid")),
                    BatchAction::delete("a"),
                    BatchAction::delete("a"),
                ],
            )
            .await
            .unwrap();

        let statuses: Vec<u16> = outcomes.iter().map(|o| o.status).collect();
        assert_eq!(statuses, vec![201, 200, 400, 200, 404]);
        assert!(!outcomes[2].succeeded());
        assert!(outcomes[4].succeeded());
        assert_eq!(service.document_count("entities"), Some(0));
    }

    #[tokio::test]
    async fn test_keyset_pages() {
        let service = service(2);
        service
            .create_or_update_index(&IndexDefinition::for_index("entities"))
            .await
            .unwrap();
        service
            .submit_batch(
                "entities",
                ["c", "a", "e", "b", "d"]
                    .into_iter()
                    .map(|id| BatchAction::Upsert(document(id)))
                    .collect(),
            )
            .await
            .unwrap();

        let mut ids = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = service
                .search("entities", "*", token.as_deref())
                .await
                .unwrap();
            assert!(page.documents.len() <= 2);
            ids.extend(page.documents.into_iter().map(|d| d.id));
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_invalid_filter_is_bad_request() {
        let service = service(10);
        service
            .create_or_update_index(&IndexDefinition::for_index("entities"))
            .await
            .unwrap();
        assert!(matches!(
            service.search("entities", "city eq 'X'", None).await,
            Err(TransportError::BadRequest { .. })
        ));
        assert!(matches!(
            service.search("entities", "*", Some("not a token")).await,
            Err(TransportError::BadRequest { .. })
        ));
    }
}
