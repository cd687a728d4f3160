//! PubMed source implementation.
//!
//! Two-step lookup through NCBI E-utilities: `esearch` returns up to 30
//! PMIDs, then one batched `esummary` call returns their metadata. No
//! abstract endpoint is used, so abstracts are always empty and open access
//! is always false.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::Config;
use crate::models::{record_id, Provider, Record, RecordBuilder, SearchQuery};
use crate::sources::{
    get_json, probe, HealthStatus, Source, SourceCapabilities, SourceError,
    MAX_RESULTS_PER_PROVIDER,
};
use crate::utils::{classify, first_year, map_language_opt, HttpClient, RetryConfig};

/// Value of the E-utilities `tool` parameter
const TOOL_NAME: &str = "psisearch";

/// PubMed source
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: HttpClient,
    esearch_url: String,
    esummary_url: String,
    email: String,
    retry: RetryConfig,
}

impl PubMedSource {
    pub fn new(
        client: HttpClient,
        esearch_url: impl Into<String>,
        esummary_url: impl Into<String>,
        email: impl Into<String>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            client,
            esearch_url: esearch_url.into(),
            esummary_url: esummary_url.into(),
            email: email.into(),
            retry,
        }
    }

    pub fn from_config(config: &Config, client: HttpClient) -> Self {
        Self::new(
            client,
            config.endpoints.pubmed_esearch.clone(),
            config.endpoints.pubmed_esummary.clone(),
            config.http.contact_email.clone(),
            RetryConfig::from(&config.retry),
        )
    }

    /// esearch term: the free text ANDed with the publication-date range
    fn search_term(query: &SearchQuery) -> String {
        let date_term = format!(
            "(\"{}/01/01\"[Date - Publication] : \"{}/12/31\"[Date - Publication])",
            query.year_from, query.year_to
        );
        if query.q.is_empty() {
            date_term
        } else {
            format!("{} AND {}", query.q, date_term)
        }
    }

    fn esearch_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        vec![
            ("db", "pubmed".to_string()),
            ("term", Self::search_term(query)),
            ("retmode", "json".to_string()),
            ("retmax", MAX_RESULTS_PER_PROVIDER.to_string()),
            ("sort", "relevance".to_string()),
            ("tool", TOOL_NAME.to_string()),
            ("email", self.email.clone()),
        ]
    }

    fn esummary_params(&self, ids: &[String]) -> Vec<(&'static str, String)> {
        vec![
            ("db", "pubmed".to_string()),
            ("id", ids.join(",")),
            ("retmode", "json".to_string()),
            ("tool", TOOL_NAME.to_string()),
            ("email", self.email.clone()),
        ]
    }
}

#[async_trait]
impl Source for PubMedSource {
    fn provider(&self) -> Provider {
        Provider::PubMed
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::HEALTH_CHECK
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        let search: ESearchResponse = get_json(
            &self.client,
            &self.esearch_url,
            &self.esearch_params(query),
            "PubMed esearch",
            self.retry,
        )
        .await?;

        let ids: Vec<String> = search
            .esearchresult
            .idlist
            .into_iter()
            .take(MAX_RESULTS_PER_PROVIDER)
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let summary: ESummaryResponse = get_json(
            &self.client,
            &self.esummary_url,
            &self.esummary_params(&ids),
            "PubMed esummary",
            self.retry,
        )
        .await?;

        Ok(summary.into_records())
    }

    async fn health_check(&self) -> HealthStatus {
        let params = [
            ("db", "pubmed".to_string()),
            ("term", "cancer".to_string()),
            ("retmode", "json".to_string()),
            ("retmax", "1".to_string()),
        ];
        probe(&self.client, &self.esearch_url, &params).await
    }
}

// ===== E-utilities API Types =====

#[derive(Debug, Default, Deserialize)]
struct ESearchResponse {
    #[serde(default)]
    esearchresult: ESearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ESummaryResponse {
    #[serde(default)]
    result: ESummaryResult,
}

/// `result` holds a `uids` list next to one object per uid
#[derive(Debug, Default, Deserialize)]
struct ESummaryResult {
    #[serde(default)]
    uids: Vec<String>,
    #[serde(flatten)]
    items: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DocSummary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<DocAuthor>,
    fulljournalname: Option<String>,
    source: Option<String>,
    #[serde(default)]
    pubdate: String,
    #[serde(default)]
    articleids: Vec<ArticleId>,
    #[serde(default)]
    lang: Vec<String>,
    #[serde(default)]
    pubtype: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DocAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ArticleId {
    #[serde(default)]
    idtype: String,
    #[serde(default)]
    value: String,
}

impl ESummaryResponse {
    /// Records in `uids` order; uids without a usable summary are skipped
    fn into_records(mut self) -> Vec<Record> {
        let uids = std::mem::take(&mut self.result.uids);
        uids.into_iter()
            .filter_map(|uid| {
                let value = self.result.items.remove(&uid)?;
                match serde_json::from_value::<DocSummary>(value) {
                    Ok(doc) => Some(classify(doc.into_record(&uid))),
                    Err(e) => {
                        tracing::debug!(uid = %uid, "Skipping unreadable PubMed summary: {}", e);
                        None
                    }
                }
            })
            .take(MAX_RESULTS_PER_PROVIDER)
            .collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl DocSummary {
    fn into_record(self, uid: &str) -> Record {
        let doi = self
            .articleids
            .iter()
            .find(|a| a.idtype == "doi")
            .map(|a| a.value.clone());
        let id = record_id(doi.as_deref(), Provider::PubMed, uid);

        let journal = non_blank(self.fulljournalname)
            .or_else(|| non_blank(self.source))
            .unwrap_or_default();

        let authors = self
            .authors
            .into_iter()
            .map(|a| a.name)
            .filter(|n| !n.trim().is_empty())
            .collect();

        RecordBuilder::new(id, self.title, Provider::PubMed)
            .authors(authors)
            .year(first_year(&self.pubdate))
            .journal(journal)
            .doi(doi)
            .oa(false)
            .language(map_language_opt(self.lang.first().map(String::as_str)))
            .url(Some(format!("https://pubmed.ncbi.nlm.nih.gov/{}/", uid)))
            .study_type(self.pubtype.into_iter().next())
            .build()
    }
}
