//! Fan-out search across all registered providers.

use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{Provider, Record, SearchFilters, SearchOutcome, SearchQuery};
use crate::sources::{HealthStatus, ProviderError, Source, SourceCapabilities, SourceRegistry};
use crate::utils::{apply_filters, build_facets, reconcile};

/// Runs one search across every adapter and reduces the results.
///
/// Adapters are invoked concurrently and all of them are awaited; a failing
/// adapter never cancels its siblings. Records are concatenated in
/// registration order before reconciliation, so the first registered
/// provider supplies defaults when records merge. Merge precedence follows
/// this input order, not the order in which responses arrive.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<SourceRegistry>,
}

impl Orchestrator {
    pub fn new(registry: SourceRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Query every adapter; successes and failures are returned side by side
    pub async fn fetch_all(&self, query: &SearchQuery) -> (Vec<Record>, Vec<ProviderError>) {
        let calls = self.registry.all().map(|source| {
            let source: &dyn Source = source.as_ref();
            async move {
                debug!(provider = source.id(), q = %query.q, "Querying provider");
                (source.provider(), source.search(query).await)
            }
        });

        let mut records = Vec::new();
        let mut failures = Vec::new();

        for (provider, result) in join_all(calls).await {
            match result {
                Ok(batch) => {
                    debug!(provider = provider.id(), count = batch.len(), "Provider returned");
                    records.extend(batch);
                }
                Err(cause) => {
                    warn!(provider = provider.id(), "Provider failed: {}", cause);
                    failures.push(ProviderError::new(provider, cause));
                }
            }
        }

        (records, failures)
    }

    /// Fetch, reconcile, filter and count facets.
    ///
    /// Provider failures land in `errors`; when every provider fails the
    /// outcome has zero records and one error per provider.
    pub async fn run(&self, query: &SearchQuery, filters: &SearchFilters) -> SearchOutcome {
        let (fetched, failures) = self.fetch_all(query).await;
        let fetched_count = fetched.len();

        let records = apply_filters(reconcile(fetched), filters);
        let facets = build_facets(&records);

        let errors: BTreeMap<Provider, String> = failures
            .into_iter()
            .map(|e| (e.provider, e.cause.to_string()))
            .collect();

        info!(
            q = %query.q,
            year_from = query.year_from,
            year_to = query.year_to,
            fetched = fetched_count,
            results = records.len(),
            failed = errors.len(),
            "Search complete"
        );

        SearchOutcome {
            records,
            errors,
            facets,
            query: query.clone(),
            generation: 0,
        }
    }

    /// Probe every adapter that supports health checks, concurrently
    pub async fn health(&self) -> Vec<(Provider, HealthStatus)> {
        let probes = self
            .registry
            .with_capability(SourceCapabilities::HEALTH_CHECK)
            .into_iter()
            .map(|source| async move { (source.provider(), source.health_check().await) });
        join_all(probes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordBuilder;
    use crate::sources::MockSource;
    use std::collections::BTreeSet;

    fn registry(sources: Vec<MockSource>) -> SourceRegistry {
        let mut registry = SourceRegistry::empty();
        for source in sources {
            registry.register(Arc::new(source));
        }
        registry
    }

    fn screening(provider: Provider) -> Record {
        RecordBuilder::new("10.1/x", "Cancer Screening", provider)
            .doi(Some("10.1/X".to_string()))
            .year(Some(2020))
            .build()
    }

    #[tokio::test]
    async fn test_partial_failure() {
        let orchestrator = Orchestrator::new(registry(vec![
            MockSource::with_records(Provider::Crossref, vec![screening(Provider::Crossref)]),
            MockSource::failing(Provider::PubMed, 500),
            MockSource::with_records(
                Provider::Doaj,
                vec![
                    screening(Provider::Doaj),
                    RecordBuilder::new("doaj:2", "Other", Provider::Doaj).build(),
                ],
            ),
        ]));

        let outcome = orchestrator
            .run(&SearchQuery::new("cancer"), &SearchFilters::default())
            .await;

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[&Provider::PubMed], "PubMed HTTP 500");
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(
            outcome.records[0].sources,
            BTreeSet::from([Provider::Crossref, Provider::Doaj])
        );
        assert_eq!(outcome.facets.source.get(&Provider::PubMed), None);
    }

    #[tokio::test]
    async fn test_all_fail_is_not_fatal() {
        let orchestrator = Orchestrator::new(registry(vec![
            MockSource::failing(Provider::Crossref, 503),
            MockSource::failing(Provider::PubMed, 500),
            MockSource::failing(Provider::Doaj, 404),
        ]));

        let outcome = orchestrator
            .run(&SearchQuery::default(), &SearchFilters::default())
            .await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.errors.len(), 3);
        assert!(outcome.facets.is_empty());
    }

    #[tokio::test]
    async fn test_facets_follow_filters() {
        let oa = RecordBuilder::new("doaj:1", "A", Provider::Doaj)
            .oa(true)
            .language(Some("en".to_string()))
            .build();
        let closed = RecordBuilder::new("crossref:b", "B", Provider::Crossref)
            .language(Some("pt".to_string()))
            .build();
        let orchestrator = Orchestrator::new(registry(vec![
            MockSource::with_records(Provider::Crossref, vec![closed]),
            MockSource::with_records(Provider::Doaj, vec![oa]),
        ]));

        let outcome = orchestrator
            .run(&SearchQuery::default(), &SearchFilters::default().oa_only(true))
            .await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.facets.language.len(), 1);
        assert!(!outcome.has_errors());
    }

    #[tokio::test]
    async fn test_health_skips_sources_without_probe() {
        let orchestrator = Orchestrator::new(registry(vec![MockSource::new(Provider::Doaj)]));
        assert!(orchestrator.health().await.is_empty());
    }
}
