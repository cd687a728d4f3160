//! Integration tests for psisearch
//!
//! These tests drive the public API end to end: real adapters against a local
//! mock server, the orchestrator pipeline over mock sources, the saved list on
//! disk and the MCP tool registry.

use mockito::{Matcher, Server, ServerGuard};
use psisearch::config::Config;
use psisearch::mcp::ToolRegistry;
use psisearch::models::{Provider, Record, RecordBuilder, SearchFilters, SearchParams, SearchQuery};
use psisearch::search::{Orchestrator, SearchSession};
use psisearch::sources::{MockSource, SourceRegistry};
use psisearch::utils::{to_bibtex_all, FileStore, SavedList};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Configuration pointing every provider at the mock server, with fast retries
fn config_for(server: &ServerGuard) -> Config {
    let mut config = Config::default();
    config.endpoints.crossref = server.url();
    config.endpoints.pubmed_esearch = format!("{}/esearch.fcgi", server.url());
    config.endpoints.pubmed_esummary = format!("{}/esummary.fcgi", server.url());
    config.endpoints.doaj = format!("{}/api/v2/search/articles", server.url());
    config.retry.max_attempts = 2;
    config.retry.initial_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config
}

fn registry_of(sources: Vec<MockSource>) -> SourceRegistry {
    let mut registry = SourceRegistry::empty();
    for source in sources {
        registry.register(Arc::new(source));
    }
    registry
}

fn session_of(sources: Vec<MockSource>) -> SearchSession {
    SearchSession::new(Orchestrator::new(registry_of(sources)), SavedList::in_memory())
}

#[tokio::test]
async fn test_end_to_end_merge_across_providers() {
    let mut server = Server::new_async().await;

    let crossref = server
        .mock("GET", "/works")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query".to_string(), "cancer".to_string()),
            Matcher::UrlEncoded(
                "filter".to_string(),
                "from-pub-date:2020-01-01,until-pub-date:2021-12-31,type:journal-article"
                    .to_string(),
            ),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "ok",
                "message": {
                    "items": [{
                        "DOI": "10.1/X",
                        "title": ["Cancer Screening"],
                        "author": [{"family": "Doe", "given": "Jane"}],
                        "container-title": ["Journal of Oncology"],
                        "issued": {"date-parts": [[2020]]}
                    }]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let esearch = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(2)
        .create_async()
        .await;
    let esummary = server
        .mock("GET", "/esummary.fcgi")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let doaj = server
        .mock("GET", Matcher::Regex(r"^/api/v2/search/articles/".to_string()))
        .match_query(Matcher::UrlEncoded("pageSize".to_string(), "30".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "results": [{
                    "id": "d1",
                    "bibjson": {
                        "title": "Cancer screening",
                        "year": "2020",
                        "identifier": [{"type": "doi", "id": "10.1/x"}],
                        "abstract": "<p>A systematic review of screening programmes.</p>",
                        "language": ["eng"]
                    }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let registry = SourceRegistry::from_config(&config_for(&server)).unwrap();
    let outcome = Orchestrator::new(registry)
        .run(
            &SearchQuery::new("cancer").years(2020, 2021),
            &SearchFilters::default(),
        )
        .await;

    crossref.assert_async().await;
    esearch.assert_async().await;
    esummary.assert_async().await;
    doaj.assert_async().await;

    assert_eq!(outcome.records.len(), 1);
    let record = &outcome.records[0];
    assert_eq!(record.id, "10.1/x");
    assert_eq!(
        record.sources,
        BTreeSet::from([Provider::Crossref, Provider::Doaj])
    );
    assert!(record.oa);
    assert_eq!(record.abstract_text, "A systematic review of screening programmes.");
    assert_eq!(record.journal, "Journal of Oncology");
    assert_eq!(record.authors, vec!["Doe, Jane"]);
    assert_eq!(record.study_type.as_deref(), Some("Review"));
    assert_eq!(record.language.as_deref(), Some("en"));

    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[&Provider::PubMed].contains("500"));
    assert_eq!(outcome.facets.source[&Provider::Crossref], 1);
    assert_eq!(outcome.facets.source[&Provider::Doaj], 1);
}

#[tokio::test]
async fn test_all_providers_failing_is_an_empty_outcome() {
    let session = session_of(vec![
        MockSource::failing(Provider::Crossref, 503),
        MockSource::failing(Provider::PubMed, 500),
        MockSource::failing(Provider::Doaj, 502),
    ]);

    let outcome = session.search(&SearchParams::default()).await.unwrap();

    assert!(outcome.is_empty());
    assert!(outcome.has_errors());
    assert_eq!(
        outcome.errors.keys().copied().collect::<Vec<_>>(),
        Provider::ALL.to_vec()
    );
    assert!(outcome.facets.is_empty());
}

#[tokio::test]
async fn test_language_facets_and_filters() {
    let lang = |id: &str, code: &str, provider: Provider| {
        RecordBuilder::new(id, format!("Title {}", id), provider)
            .language(Some(code.to_string()))
            .build()
    };
    let sources = || {
        vec![
            MockSource::with_records(
                Provider::Crossref,
                vec![lang("crossref:a", "en", Provider::Crossref)],
            ),
            MockSource::with_records(
                Provider::PubMed,
                vec![lang("pubmed:b", "EN", Provider::PubMed)],
            ),
            MockSource::with_records(Provider::Doaj, vec![lang("doaj:c", "pt", Provider::Doaj)]),
        ]
    };

    let outcome = session_of(sources()).search(&SearchParams::default()).await.unwrap();
    assert_eq!(
        outcome.facets.language,
        BTreeMap::from([("en".to_string(), 2), ("pt".to_string(), 1)])
    );

    let params = SearchParams {
        lang: vec!["pt".to_string()],
        ..Default::default()
    };
    let filtered = session_of(sources()).search(&params).await.unwrap();
    assert_eq!(filtered.records.len(), 1);
    assert_eq!(filtered.records[0].id, "doaj:c");
}

#[tokio::test]
async fn test_malformed_years_fall_back_to_defaults() {
    let session = session_of(vec![MockSource::new(Provider::Doaj)]);
    let params = SearchParams {
        q: "anxiety".to_string(),
        year_from: Some("20x0".to_string()),
        year_to: Some(String::new()),
        ..Default::default()
    };

    let outcome = session.search(&params).await.unwrap();
    assert_eq!(outcome.query.year_from, 2019);
    assert_eq!(outcome.query.year_to, 2025);
}

#[tokio::test]
async fn test_saved_list_persists_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let record = RecordBuilder::new("10.1/x", "Cancer Screening", Provider::Doaj)
        .authors(vec!["Doe, Jane".to_string()])
        .year(Some(2020))
        .doi(Some("10.1/x".to_string()))
        .build();

    let session = SearchSession::new(
        Orchestrator::new(SourceRegistry::empty()),
        SavedList::new(Arc::new(FileStore::new(dir.path()))),
    );
    assert!(session.toggle_saved(&record).unwrap());

    // a second handle over the same directory sees the snapshot
    let reopened = SavedList::new(Arc::new(FileStore::new(dir.path())));
    let items: Vec<Record> = reopened.load();
    assert_eq!(items, vec![record.clone()]);
    assert!(to_bibtex_all(&items).starts_with("@article{doe2020,"));

    assert!(reopened.remove("10.1/x").unwrap());
    assert!(!session.is_saved("10.1/x"));
}

#[tokio::test]
async fn test_mcp_search_tool_over_mock_sources() {
    let record = RecordBuilder::new("doaj:1", "Qualitative interviews with nurses", Provider::Doaj)
        .oa(true)
        .build();
    let session = session_of(vec![
        MockSource::with_records(Provider::Doaj, vec![record]),
        MockSource::failing(Provider::Crossref, 500),
    ]);
    let tools = ToolRegistry::from_session(Arc::new(session));

    let result = tools
        .execute(
            "search_literature",
            json!({ "q": "nurses", "year_from": 2020, "year_to": 2021, "oa": true }),
        )
        .await
        .unwrap();

    assert_eq!(result["query"]["year_from"], 2020);
    assert_eq!(result["records"][0]["id"], "doaj:1");
    assert_eq!(result["errors"]["crossref"], "Crossref HTTP 500");

    let saved = tools
        .execute("toggle_saved", json!({ "record": result["records"][0] }))
        .await
        .unwrap();
    assert_eq!(saved["saved"], true);
}
