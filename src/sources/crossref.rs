//! Crossref source implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::models::{record_id, Provider, Record, RecordBuilder, SearchQuery};
use crate::sources::{
    first_of, get_json, probe, HealthStatus, OneOrMany, Source, SourceCapabilities, SourceError,
    MAX_RESULTS_PER_PROVIDER,
};
use crate::utils::{
    classify, clean_abstract, map_language_opt, normalize_title, HttpClient, RetryConfig,
};

/// Crossref source
///
/// Uses the Crossref REST API `works` endpoint, filtered to journal articles
/// published within the year range.
#[derive(Debug, Clone)]
pub struct CrossrefSource {
    client: HttpClient,
    base_url: String,
    retry: RetryConfig,
}

impl CrossrefSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    pub fn from_config(config: &Config, client: HttpClient) -> Self {
        Self::new(
            client,
            config.endpoints.crossref.clone(),
            RetryConfig::from(&config.retry),
        )
    }

    fn works_url(&self) -> String {
        format!("{}/works", self.base_url)
    }

    /// Query parameters for a search; `query` is omitted when empty
    fn search_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(3);
        if !query.q.is_empty() {
            params.push(("query", query.q.clone()));
        }
        params.push(("rows", MAX_RESULTS_PER_PROVIDER.to_string()));
        params.push((
            "filter",
            format!(
                "from-pub-date:{}-01-01,until-pub-date:{}-12-31,type:journal-article",
                query.year_from, query.year_to
            ),
        ));
        params
    }
}

#[async_trait]
impl Source for CrossrefSource {
    fn provider(&self) -> Provider {
        Provider::Crossref
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::HEALTH_CHECK | SourceCapabilities::ABSTRACTS
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        let data: CrossrefResponse = get_json(
            &self.client,
            &self.works_url(),
            &Self::search_params(query),
            "Crossref",
            self.retry,
        )
        .await?;

        Ok(data
            .message
            .items
            .into_iter()
            .take(MAX_RESULTS_PER_PROVIDER)
            .map(|item| classify(item.into_record()))
            .collect())
    }

    async fn health_check(&self) -> HealthStatus {
        probe(&self.client, &self.works_url(), &[("rows", "0".to_string())]).await
    }
}

// ===== Crossref API Types =====

#[derive(Debug, Default, Deserialize)]
struct CrossrefResponse {
    #[serde(default)]
    message: CrossrefMessage,
}

#[derive(Debug, Default, Deserialize)]
struct CrossrefMessage {
    #[serde(default)]
    items: Vec<CrossrefItem>,
}

#[derive(Debug, Deserialize)]
struct CrossrefItem {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(default)]
    title: Option<OneOrMany>,
    #[serde(default)]
    author: Vec<CrossrefAuthor>,
    issued: Option<CrossrefDate>,
    created: Option<CrossrefDate>,
    #[serde(rename = "container-title", default)]
    container_title: Option<OneOrMany>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(default)]
    link: Vec<CrossrefLink>,
    language: Option<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrossrefAuthor {
    family: Option<String>,
    given: Option<String>,
}

impl CrossrefAuthor {
    /// "Family, Given" with missing parts skipped
    fn display_name(&self) -> String {
        [self.family.as_deref(), self.given.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Deserialize)]
struct CrossrefDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i32>>>,
}

impl CrossrefDate {
    fn year(&self) -> Option<i32> {
        self.date_parts
            .first()
            .and_then(|parts| parts.first().copied().flatten())
            .filter(|y| *y != 0)
    }
}

#[derive(Debug, Deserialize)]
struct CrossrefLink {
    #[serde(rename = "content-type")]
    content_type: Option<String>,
}

impl CrossrefItem {
    fn into_record(self) -> Record {
        let title = first_of(&self.title).unwrap_or_default();
        let doi = self
            .doi
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);

        let url = self
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| doi.as_ref().map(|d| format!("https://doi.org/{}", d)));

        let native_id = url.clone().unwrap_or_else(|| normalize_title(&title));
        let id = record_id(doi.as_deref(), Provider::Crossref, &native_id);

        let year = self
            .issued
            .as_ref()
            .and_then(CrossrefDate::year)
            .or_else(|| self.created.as_ref().and_then(CrossrefDate::year));

        let oa = self.link.iter().any(|l| {
            l.content_type
                .as_deref()
                .is_some_and(|ct| ct.to_lowercase().contains("pdf"))
        });

        let authors = self
            .author
            .iter()
            .map(CrossrefAuthor::display_name)
            .filter(|a| !a.is_empty())
            .collect();

        RecordBuilder::new(id, title, Provider::Crossref)
            .authors(authors)
            .year(year)
            .journal(first_of(&self.container_title).unwrap_or_default())
            .doi(doi)
            .abstract_text(clean_abstract(self.abstract_text.as_deref().unwrap_or("")))
            .oa(oa)
            .language(map_language_opt(self.language.as_deref()))
            .url(url)
            .build()
    }
}
