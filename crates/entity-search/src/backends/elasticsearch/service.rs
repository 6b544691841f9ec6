//! [`SearchService`] implementation for Elasticsearch.

use async_trait::async_trait;
use elasticsearch::http::request::JsonBody;
use elasticsearch::indices::{
    IndicesCreateParts, IndicesDeleteParts, IndicesGetMappingParts, IndicesPutMappingParts,
};
use elasticsearch::params::Refresh;
use elasticsearch::{BulkParts, SearchParts};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::core::{ActionKind, ActionOutcome, BatchAction, IndexProbe, SearchService};
use crate::error::TransportError;
use crate::filter::Filter;
use crate::schema::{IndexDefinition, SearchDocument};
use crate::types::{PageToken, SearchPage};

use super::backend::{
    ElasticsearchSearchService, SERVICE_NAME, json_body, send_error, status_error,
};
use super::query::build_search_body;
use super::schema::{create_index_mapping, create_mappings, recorded_schema_version};

#[async_trait]
impl SearchService for ElasticsearchSearchService {
    fn name(&self) -> &'static str {
        SERVICE_NAME
    }

    async fn probe_index(&self, name: &str) -> Result<IndexProbe, TransportError> {
        let response = self
            .client()
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| send_error("Failed to probe index", e))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(IndexProbe::NotFound);
        }
        if !status.is_success() {
            return Err(status_error(name, response).await);
        }

        let body = json_body(response).await?;
        Ok(IndexProbe::Found {
            schema_version: recorded_schema_version(&body),
        })
    }

    async fn create_or_update_index(
        &self,
        definition: &IndexDefinition,
    ) -> Result<(), TransportError> {
        let name = definition.name.as_str();
        let response = self
            .client()
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(create_index_mapping(self.config(), definition))
            .send()
            .await
            .map_err(|e| send_error("Failed to create index", e))?;

        let status = response.status_code();
        if status.is_success() {
            info!(index = name, "created Elasticsearch index");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if !body.contains("resource_already_exists_exception") {
            return Err(TransportError::from_status(
                SERVICE_NAME,
                name,
                status.as_u16(),
                body,
            ));
        }

        // Lost a creation race or the index predates this call; update in place.
        let response = self
            .client()
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[name]))
            .body(create_mappings(definition))
            .send()
            .await
            .map_err(|e| send_error("Failed to update index mapping", e))?;

        if !response.status_code().is_success() {
            return Err(status_error(name, response).await);
        }

        debug!(index = name, "updated Elasticsearch index mapping");
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), TransportError> {
        let response = self
            .client()
            .indices()
            .delete(IndicesDeleteParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| send_error("Failed to delete index", e))?;

        if !response.status_code().is_success() {
            return Err(status_error(name, response).await);
        }

        info!(index = name, "deleted Elasticsearch index");
        Ok(())
    }

    async fn submit_batch(
        &self,
        index: &str,
        actions: Vec<BatchAction>,
    ) -> Result<Vec<ActionOutcome>, TransportError> {
        if actions.is_empty() {
            return Ok(Vec::new());
        }

        let requested: Vec<(String, ActionKind)> = actions
            .iter()
            .map(|a| (a.id().to_string(), a.kind()))
            .collect();
        let body: Vec<JsonBody<Value>> = bulk_lines(index, actions)?
            .into_iter()
            .map(JsonBody::new)
            .collect();

        let refresh = if self.config().refresh_on_write {
            Refresh::WaitFor
        } else {
            Refresh::False
        };

        let response = self
            .client()
            .bulk(BulkParts::Index(index))
            .refresh(refresh)
            .body(body)
            .send()
            .await
            .map_err(|e| send_error("Failed to submit bulk request", e))?;

        if !response.status_code().is_success() {
            return Err(status_error(index, response).await);
        }

        let body = json_body(response).await?;
        debug!(index, actions = requested.len(), "bulk request completed");
        Ok(parse_bulk_response(&requested, &body))
    }

    async fn search(
        &self,
        index: &str,
        filter: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, TransportError> {
        let filter = Filter::parse(filter).map_err(|e| e.into_transport(SERVICE_NAME))?;
        let token = page_token.map(PageToken::decode).transpose()?;
        let page_size = self.config().effective_page_size();
        let body = build_search_body(&filter, page_size, token.as_ref())
            .map_err(|e| e.into_transport(SERVICE_NAME))?;

        let response = self
            .client()
            .search(SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_err(|e| send_error("Search failed", e))?;

        if !response.status_code().is_success() {
            return Err(status_error(index, response).await);
        }

        let body = json_body(response).await?;
        parse_search_response(&body, page_size)
    }
}

/// Builds the newline-delimited bulk body: an action line per action,
/// followed by the document for upserts.
pub fn bulk_lines(index: &str, actions: Vec<BatchAction>) -> Result<Vec<Value>, TransportError> {
    let mut lines = Vec::with_capacity(actions.len() * 2);
    for action in actions {
        match action {
            BatchAction::Upsert(document) => {
                lines.push(json!({ "index": { "_index": index, "_id": &document.id } }));
                lines.push(serde_json::to_value(&document).map_err(|e| {
                    TransportError::Serialization {
                        message: format!("Failed to serialize document {}: {}", document.id, e),
                    }
                })?);
            }
            BatchAction::Delete { id } => {
                lines.push(json!({ "delete": { "_index": index, "_id": id } }));
            }
        }
    }
    Ok(lines)
}

/// Reads per-item outcomes from a bulk response, in request order.
///
/// Deleting a missing document reports `not_found`, which counts as success.
pub fn parse_bulk_response(requested: &[(String, ActionKind)], body: &Value) -> Vec<ActionOutcome> {
    let items = body
        .get("items")
        .and_then(|i| i.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    requested
        .iter()
        .enumerate()
        .map(|(i, (id, kind))| {
            let Some(item) = items
                .get(i)
                .and_then(|item| item.as_object())
                .and_then(|item| item.values().next())
            else {
                return ActionOutcome::failure(id, *kind, 500, "no result reported for action");
            };

            let status = item
                .get("status")
                .and_then(|s| s.as_u64())
                .and_then(|s| u16::try_from(s).ok())
                .unwrap_or(500);

            if let Some(error) = item.get("error") {
                let reason = error
                    .get("reason")
                    .and_then(|r| r.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string());
                return ActionOutcome::failure(id, *kind, status, reason);
            }

            let not_found = item.get("result").and_then(|r| r.as_str()) == Some("not_found");
            if (200..300).contains(&status) || (*kind == ActionKind::Delete && not_found) {
                ActionOutcome::success(id, *kind, status)
            } else {
                ActionOutcome::failure(id, *kind, status, format!("status {}", status))
            }
        })
        .collect()
}

/// Reads one page of documents from a search response fetched with
/// `page_size + 1` hits.
pub fn parse_search_response(body: &Value, page_size: usize) -> Result<SearchPage, TransportError> {
    let hits = body
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut documents = Vec::with_capacity(hits.len().min(page_size));
    let mut last_sort: Option<Vec<Value>> = None;

    for hit in hits.iter().take(page_size) {
        let Some(source) = hit.get("_source") else {
            continue;
        };
        let document: SearchDocument =
            serde_json::from_value(source.clone()).map_err(|e| TransportError::Serialization {
                message: format!("Failed to parse search hit: {}", e),
            })?;
        documents.push(document);

        if let Some(sort) = hit.get("sort").and_then(|s| s.as_array()) {
            last_sort = Some(sort.clone());
        }
    }

    let next_token = if hits.len() > page_size {
        last_sort.map(|values| PageToken::after(values).encode())
    } else {
        None
    };

    Ok(SearchPage::new(documents, next_token))
}
