//! Bibliographic provider adapters.
//!
//! This module defines the [`Source`] trait that every provider adapter
//! implements. An adapter turns one `(q, year_from, year_to)` query into at
//! most [`MAX_RESULTS_PER_PROVIDER`] classified [`Record`]s, or fails with a
//! [`SourceError`] that the orchestrator records against its provider.
//!
//! Three adapters ship with the crate, each configured by a base URL from the
//! `[endpoints]` section:
//!
//! - [`CrossrefSource`] - single request filtered by publication date and
//!   `type:journal-article`
//! - [`PubMedSource`] - two-step esearch then esummary
//! - [`DoajSource`] - single request in the DOAJ query syntax
//!
//! [`MockSource`] returns scripted results and is used by the tests.

mod crossref;
mod doaj;
pub mod mock;
mod pubmed;
mod registry;

pub use crossref::CrossrefSource;
pub use doaj::DoajSource;
pub use mock::MockSource;
pub use pubmed::PubMedSource;
pub use registry::{SourceCapabilities, SourceRegistry};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::{Provider, Record, SearchQuery};
use crate::utils::{with_retry, HttpClient, RetryConfig};

/// Hard cap on records returned by one provider call
pub const MAX_RESULTS_PER_PROVIDER: usize = 30;

/// The Source trait defines the interface for all provider adapters.
///
/// # Implementing a New Source
///
/// 1. Create a struct holding its base URL and an [`HttpClient`]
/// 2. Implement `provider` and `search`; classify each record before returning it
/// 3. Optionally implement `health_check` and advertise it in `capabilities`
/// 4. Add the source to [`SourceRegistry::from_config`] or register it dynamically
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Provider this adapter represents
    fn provider(&self) -> Provider;

    /// Unique identifier (used in error keys and record ids)
    fn id(&self) -> &str {
        self.provider().id()
    }

    /// Human-readable name of this source
    fn name(&self) -> &str {
        self.provider().name()
    }

    /// Describe the capabilities of this source
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    /// Fetch, normalize and classify records for the query.
    ///
    /// Zero hits is an empty vector, never an error.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError>;

    /// Lightweight reachability probe. Never fails; problems are reported
    /// as [`HealthStatus::Offline`].
    async fn health_check(&self) -> HealthStatus {
        HealthStatus::Offline("health check not supported".to_string())
    }
}

/// Result of a provider probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum HealthStatus {
    Online,
    Offline(String),
}

impl HealthStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, HealthStatus::Online)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Online => write!(f, "online"),
            HealthStatus::Offline(reason) => write!(f, "offline ({})", reason),
        }
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Connection failure or timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("{context} HTTP {status}")]
    Api { context: String, status: u16 },

    /// Malformed payload
    #[error("Parse error: {0}")]
    Parse(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

/// One adapter's failure, attributed to its provider
#[derive(Debug, thiserror::Error)]
#[error("{provider}: {cause}")]
pub struct ProviderError {
    pub provider: Provider,
    #[source]
    pub cause: SourceError,
}

impl ProviderError {
    pub fn new(provider: Provider, cause: SourceError) -> Self {
        Self { provider, cause }
    }
}

/// GET a JSON document with retry. Non-2xx becomes [`SourceError::Api`]
/// labelled with `context`; an undecodable body becomes [`SourceError::Parse`].
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &HttpClient,
    url: &str,
    params: &[(&str, String)],
    context: &str,
    retry: RetryConfig,
) -> Result<T, SourceError> {
    tracing::debug!(url, ?params, "{} request", context);

    with_retry(retry, || async move {
        let response = client.get(url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Api {
                context: context.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Parse(format!("{}: {}", context, e)))
    })
    .await
}

/// Probe a URL: any 2xx is online, anything else is reported with its reason
pub(crate) async fn probe(client: &HttpClient, url: &str, params: &[(&str, String)]) -> HealthStatus {
    match client.get(url).query(params).send().await {
        Ok(response) if response.status().is_success() => HealthStatus::Online,
        Ok(response) => HealthStatus::Offline(format!("HTTP {}", response.status().as_u16())),
        Err(e) => HealthStatus::Offline(e.to_string()),
    }
}

/// A JSON field that providers send either as a string or a list of strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// The string itself, or the first element of the list
    pub fn first(&self) -> Option<&str> {
        match self {
            OneOrMany::One(s) => Some(s.as_str()),
            OneOrMany::Many(v) => v.first().map(|s| s.as_str()),
        }
    }
}

/// First non-blank value of an optional string-or-list field
pub(crate) fn first_of(field: &Option<OneOrMany>) -> Option<String> {
    field
        .as_ref()
        .and_then(|f| f.first())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
