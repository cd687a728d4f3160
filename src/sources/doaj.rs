//! DOAJ (Directory of Open Access Journals) source implementation.
//!
//! The whole query, free text plus year range, travels as one URL-encoded
//! path segment in the DOAJ search syntax. Everything DOAJ indexes is open
//! access.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::models::{record_id, Provider, Record, RecordBuilder, SearchQuery};
use crate::sources::{
    first_of, get_json, probe, HealthStatus, OneOrMany, Source, SourceCapabilities, SourceError,
    MAX_RESULTS_PER_PROVIDER,
};
use crate::utils::{
    classify, clean_abstract, escape_doaj_query, map_language_opt, HttpClient, RetryConfig,
};

/// DOAJ source
#[derive(Debug, Clone)]
pub struct DoajSource {
    client: HttpClient,
    base_url: String,
    retry: RetryConfig,
}

impl DoajSource {
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
            config.endpoints.doaj.clone(),
            RetryConfig::from(&config.retry),
        )
    }

    /// `(<escaped q>) AND bibjson.year:[y1 TO y2]`, or only the year clause
    fn search_expression(query: &SearchQuery) -> String {
        let year_clause = format!("bibjson.year:[{} TO {}]", query.year_from, query.year_to);
        if query.q.is_empty() {
            year_clause
        } else {
            format!("({}) AND {}", escape_doaj_query(&query.q), year_clause)
        }
    }

    fn search_url(&self, expression: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(expression))
    }
}

#[async_trait]
impl Source for DoajSource {
    fn provider(&self) -> Provider {
        Provider::Doaj
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
            | SourceCapabilities::HEALTH_CHECK
            | SourceCapabilities::ABSTRACTS
            | SourceCapabilities::OPEN_ACCESS
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        let url = self.search_url(&Self::search_expression(query));
        let data: DoajResponse = get_json(
            &self.client,
            &url,
            &[("pageSize", MAX_RESULTS_PER_PROVIDER.to_string())],
            "DOAJ",
            self.retry,
        )
        .await?;

        Ok(data
            .results
            .into_iter()
            .take(MAX_RESULTS_PER_PROVIDER)
            .map(|item| classify(item.into_record()))
            .collect())
    }

    async fn health_check(&self) -> HealthStatus {
        probe(
            &self.client,
            &self.search_url("test"),
            &[("pageSize", "1".to_string())],
        )
        .await
    }
}

// ===== DOAJ API Types =====

#[derive(Debug, Default, Deserialize)]
struct DoajResponse {
    #[serde(default)]
    results: Vec<DoajArticle>,
}

#[derive(Debug, Deserialize)]
struct DoajArticle {
    #[serde(default)]
    id: String,
    #[serde(default)]
    bibjson: BibJson,
}

#[derive(Debug, Default, Deserialize)]
struct BibJson {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: Vec<BibAuthor>,
    /// Sent as a string by DOAJ, occasionally as a number
    year: Option<serde_json::Value>,
    journal: Option<BibJournal>,
    #[serde(default)]
    identifier: Vec<BibIdentifier>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(default)]
    language: Option<OneOrMany>,
    #[serde(default)]
    link: Vec<BibLink>,
}

#[derive(Debug, Deserialize)]
struct BibAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct BibJournal {
    #[serde(default)]
    title: String,
    #[serde(default)]
    language: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
struct BibIdentifier {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct BibLink {
    #[serde(rename = "type", default)]
    kind: String,
    url: Option<String>,
}

impl BibJson {
    fn year(&self) -> Option<i32> {
        match self.year.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .filter(|y| *y != 0)
    }

    /// First link whose type mentions "full", else the first link
    fn preferred_link(&self) -> Option<String> {
        self.link
            .iter()
            .find(|l| l.kind.to_lowercase().contains("full"))
            .or_else(|| self.link.first())
            .and_then(|l| l.url.clone())
    }

    fn language(&self) -> Option<String> {
        let journal_lang = self.journal.as_ref().and_then(|j| first_of(&j.language));
        journal_lang.or_else(|| first_of(&self.language))
    }
}

impl DoajArticle {
    fn into_record(self) -> Record {
        let b = self.bibjson;

        let doi = b
            .identifier
            .iter()
            .find(|i| i.kind.eq_ignore_ascii_case("doi"))
            .map(|i| i.id.clone());
        let id = record_id(doi.as_deref(), Provider::Doaj, &self.id);

        let authors = b
            .author
            .iter()
            .map(|a| a.name.clone())
            .filter(|n| !n.trim().is_empty())
            .collect();

        RecordBuilder::new(id, b.title.clone(), Provider::Doaj)
            .authors(authors)
            .year(b.year())
            .journal(b.journal.as_ref().map(|j| j.title.clone()).unwrap_or_default())
            .doi(doi)
            .abstract_text(clean_abstract(b.abstract_text.as_deref().unwrap_or("")))
            .oa(true)
            .language(map_language_opt(b.language().as_deref()))
            .url(b.preferred_link())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
        }
    }

    fn source(base: &str) -> DoajSource {
        DoajSource::new(
            HttpClient::new().unwrap(),
            format!("{}/api/v2/search/articles", base),
            fast_retry(),
        )
    }

    #[test]
    fn test_search_expression() {
        let query = SearchQuery::new("covid-19: anxiety").years(2020, 2021);
        assert_eq!(
            DoajSource::search_expression(&query),
            r"(covid\-19\: anxiety) AND bibjson.year:[2020 TO 2021]"
        );
        assert_eq!(
            DoajSource::search_expression(&SearchQuery::new("").years(2019, 2025)),
            "bibjson.year:[2019 TO 2025]"
        );
    }

    #[test]
    fn test_search_url_encodes_expression() {
        let source = source("http://localhost");
        let url = source.search_url("bibjson.year:[2019 TO 2025]");
        assert_eq!(
            url,
            "http://localhost/api/v2/search/articles/bibjson.year%3A%5B2019%20TO%202025%5D"
        );
    }

    #[test]
    fn test_article_mapping() {
        let article: DoajArticle = serde_json::from_value(json!({
            "id": "abc123",
            "bibjson": {
                "title": "Estudo qualitativo com cuidadores",
                "author": [{"name": "Silva, A"}],
                "year": "2021",
                "journal": {"title": "Revista", "language": ["por"]},
                "identifier": [{"type": "eissn", "id": "1234-5678"}, {"type": "DOI", "id": "10.9/XYZ"}],
                "abstract": "<p>Resumo</p>",
                "language": "en",
                "link": [
                    {"type": "homepage", "url": "https://example.org/home"},
                    {"type": "fulltext", "url": "https://example.org/full"}
                ]
            }
        }))
        .unwrap();

        let record = article.into_record();
        assert_eq!(record.id, "10.9/xyz");
        assert_eq!(record.year, Some(2021));
        assert_eq!(record.journal, "Revista");
        assert_eq!(record.abstract_text, "Resumo");
        assert_eq!(record.language.as_deref(), Some("pt"));
        assert_eq!(record.url.as_deref(), Some("https://example.org/full"));
        assert!(record.oa);
    }

    #[test]
    fn test_article_fallbacks() {
        let article: DoajArticle = serde_json::from_value(json!({
            "id": "def456",
            "bibjson": {
                "title": "Untitled",
                "year": 0,
                "language": ["EN"],
                "link": [{"type": "homepage", "url": "https://example.org/home"}]
            }
        }))
        .unwrap();

        let record = article.into_record();
        assert_eq!(record.id, "doaj:def456");
        assert!(record.year.is_none());
        assert_eq!(record.language.as_deref(), Some("EN"));
        assert_eq!(record.url.as_deref(), Some("https://example.org/home"));
    }

    #[tokio::test]
    async fn test_search_over_http() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                Matcher::Regex(r"^/api/v2/search/articles/.*bibjson\.year".to_string()),
            )
            .match_query(Matcher::UrlEncoded("pageSize".to_string(), "30".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "total": 1,
                    "results": [{
                        "id": "abc",
                        "bibjson": {
                            "title": "Cancer screening",
                            "year": "2020",
                            "identifier": [{"type": "doi", "id": "10.1/X"}],
                            "abstract": "A systematic review of screening."
                        }
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let records = source(&server.url())
            .search(&SearchQuery::new("cancer").years(2020, 2021))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "10.1/x");
        assert_eq!(records[0].study_type.as_deref(), Some("Review"));
        assert!(records[0].oa);
    }

    #[tokio::test]
    async fn test_server_error_is_reported_after_retries() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/api/v2/search/articles/".to_string()))
            .match_query(Matcher::Any)
            .with_status(502)
            .expect(2)
            .create_async()
            .await;

        let err = source(&server.url())
            .search(&SearchQuery::new("x"))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.to_string(), "DOAJ HTTP 502");
    }

    #[tokio::test]
    async fn test_empty_results() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/api/v2/search/articles/".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"total": 0, "results": []}).to_string())
            .create_async()
            .await;

        let records = source(&server.url())
            .search(&SearchQuery::new("nothing"))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/api/v2/search/articles/".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = source(&server.url())
            .search(&SearchQuery::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[tokio::test]
    async fn test_over_return_is_capped() {
        let results: Vec<_> = (0..35)
            .map(|i| json!({"id": format!("a{}", i), "bibjson": {"title": format!("Paper {}", i)}}))
            .collect();
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/api/v2/search/articles/".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"results": results}).to_string())
            .create_async()
            .await;

        let records = source(&server.url())
            .search(&SearchQuery::new("x"))
            .await
            .unwrap();
        assert_eq!(records.len(), MAX_RESULTS_PER_PROVIDER);
        assert_eq!(records[29].id, "doaj:a29");
    }
}
