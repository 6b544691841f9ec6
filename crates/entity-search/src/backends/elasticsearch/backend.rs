//! Elasticsearch connection configuration and client construction.

use std::fmt::Debug;
use std::time::Duration;

use elasticsearch::Elasticsearch;
use elasticsearch::auth::Credentials;
use elasticsearch::http::response::Response;
use elasticsearch::http::Url;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

pub(crate) const SERVICE_NAME: &str = "elasticsearch";

/// Credentials sent with every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElasticsearchAuth {
    /// HTTP basic authentication.
    Basic {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// An API or service token sent as a bearer token.
    Bearer {
        /// Token value.
        token: String,
    },
}

impl ElasticsearchAuth {
    fn credentials(&self) -> Credentials {
        match self {
            ElasticsearchAuth::Basic { username, password } => {
                Credentials::Basic(username.clone(), password.clone())
            }
            ElasticsearchAuth::Bearer { token } => Credentials::Bearer(token.clone()),
        }
    }
}

/// Connection and index settings for [`ElasticsearchSearchService`].
///
/// Every field except `url` has a default, so a configuration file only
/// needs to name the cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Cluster endpoint, e.g. `http://localhost:9200`.
    pub url: String,

    /// Primary shards of a newly created entity index.
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Replicas of a newly created entity index.
    #[serde(default = "default_replicas")]
    pub number_of_replicas: u32,

    /// How often a newly created entity index makes writes searchable.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    /// `index.max_result_window` of a newly created entity index. A search
    /// requests one hit more than [`page_size`](Self::page_size), so pages
    /// are capped at one below this window.
    #[serde(default = "default_max_result_window")]
    pub max_result_window: u32,

    /// Entities fetched per search request while a filter is drained.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Credentials, if the cluster requires them.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Wait for a refresh after each batch so its documents are searchable
    /// when the call returns.
    #[serde(default = "default_refresh_on_write")]
    pub refresh_on_write: bool,
}

impl ElasticsearchConfig {
    /// Creates a configuration for the cluster at `url` with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            number_of_shards: default_shards(),
            number_of_replicas: default_replicas(),
            refresh_interval: default_refresh_interval(),
            max_result_window: default_max_result_window(),
            page_size: default_page_size(),
            request_timeout_ms: default_request_timeout_ms(),
            auth: None,
            refresh_on_write: default_refresh_on_write(),
        }
    }

    /// Page size actually requested: at least one, and small enough that
    /// `page_size + 1` stays within the result window.
    pub fn effective_page_size(&self) -> usize {
        let window = usize::try_from(self.max_result_window).unwrap_or(usize::MAX);
        self.page_size.min(window.saturating_sub(1)).max(1)
    }
}

fn default_shards() -> u32 {
    1
}

fn default_replicas() -> u32 {
    1
}

fn default_refresh_interval() -> String {
    "1s".to_string()
}

fn default_max_result_window() -> u32 {
    10_000
}

fn default_page_size() -> usize {
    500
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_refresh_on_write() -> bool {
    true
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self::new("http://localhost:9200")
    }
}

/// A [`SearchService`](crate::core::SearchService) backed by an
/// Elasticsearch cluster.
///
/// Each entity index maps to one Elasticsearch index. Typed collections are
/// `nested` fields so a lambda filter matches name and value of the same
/// element.
pub struct ElasticsearchSearchService {
    client: Elasticsearch,
    config: ElasticsearchConfig,
}

impl Debug for ElasticsearchSearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchSearchService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchSearchService {
    /// Creates a service with the given configuration. No request is sent.
    pub fn new(config: ElasticsearchConfig) -> Result<Self, TransportError> {
        let client = Self::build_client(&config)?;
        Ok(Self { client, config })
    }

    fn build_client(config: &ElasticsearchConfig) -> Result<Elasticsearch, TransportError> {
        let url = Url::parse(&config.url).map_err(|e| TransportError::ConnectionFailed {
            service: SERVICE_NAME.to_string(),
            message: format!("invalid cluster URL '{}': {}", config.url, e),
        })?;

        let mut builder = TransportBuilder::new(SingleNodeConnectionPool::new(url))
            .timeout(Duration::from_millis(config.request_timeout_ms));
        if let Some(auth) = &config.auth {
            builder = builder.auth(auth.credentials());
        }

        builder
            .build()
            .map(Elasticsearch::new)
            .map_err(|e| TransportError::ConnectionFailed {
                service: SERVICE_NAME.to_string(),
                message: format!("cannot build transport for '{}': {}", config.url, e),
            })
    }

    /// Returns the Elasticsearch client.
    pub(crate) fn client(&self) -> &Elasticsearch {
        &self.client
    }

    /// Returns the service configuration.
    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }
}

/// Maps a failure to send a request.
pub(crate) fn send_error(context: &str, e: elasticsearch::Error) -> TransportError {
    TransportError::ConnectionFailed {
        service: SERVICE_NAME.to_string(),
        message: format!("{}: {}", context, e),
    }
}

/// Maps a non-success response to a transport error.
pub(crate) async fn status_error(index: &str, response: Response) -> TransportError {
    let status = response.status_code().as_u16();
    let body = response.text().await.unwrap_or_default();
    TransportError::from_status(SERVICE_NAME, index, status, body)
}

/// Reads a JSON response body.
pub(crate) async fn json_body(response: Response) -> Result<Value, TransportError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| TransportError::Serialization {
            message: format!("Failed to parse {} response: {}", SERVICE_NAME, e),
        })
}
