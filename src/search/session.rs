//! Search session: the explicit context a front-end holds between searches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use super::Orchestrator;
use crate::config::SearchDefaults;
use crate::models::{Record, SearchFilters, SearchOutcome, SearchParams};
use crate::utils::{SavedList, StoreError};

/// Holds the orchestrator, the saved list and the current filters.
///
/// Every search takes a new generation number. A search that finishes after
/// a newer one has started returns `None`, so a slow response can never
/// overwrite a fresher result.
#[derive(Debug)]
pub struct SearchSession {
    orchestrator: Orchestrator,
    saved: SavedList,
    defaults: SearchDefaults,
    filters: RwLock<SearchFilters>,
    generation: AtomicU64,
}

impl SearchSession {
    pub fn new(orchestrator: Orchestrator, saved: SavedList) -> Self {
        Self {
            orchestrator,
            saved,
            defaults: SearchDefaults::default(),
            filters: RwLock::new(SearchFilters::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Use configured default years for missing or malformed input
    pub fn with_defaults(mut self, defaults: SearchDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn saved(&self) -> &SavedList {
        &self.saved
    }

    /// Filters applied by the most recent search
    pub fn filters(&self) -> SearchFilters {
        self.filters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Latest generation handed out
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Whether `generation` belongs to the most recent search
    pub fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    /// Run a search from raw parameters.
    ///
    /// Returns `None` when a newer search started while this one was in
    /// flight.
    pub async fn search(&self, params: &SearchParams) -> Option<SearchOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (query, filters) = params.resolve_with_defaults(
            self.defaults.default_year_from,
            self.defaults.default_year_to,
        );

        *self.filters.write().unwrap_or_else(|e| e.into_inner()) = filters.clone();

        let mut outcome = self.orchestrator.run(&query, &filters).await;

        if !self.is_current(generation) {
            tracing::debug!(generation, "Discarding stale search result");
            return None;
        }

        outcome.generation = generation;
        Some(outcome)
    }

    /// Run a search for one independent caller.
    ///
    /// Shares nothing with other searches: no generation is taken and the
    /// remembered filters are left alone, so concurrent callers never
    /// invalidate each other.
    pub async fn search_detached(&self, params: &SearchParams) -> SearchOutcome {
        let (query, filters) = params.resolve_with_defaults(
            self.defaults.default_year_from,
            self.defaults.default_year_to,
        );
        self.orchestrator.run(&query, &filters).await
    }

    /// Toggle a record in the saved list; returns whether it is now saved
    pub fn toggle_saved(&self, record: &Record) -> Result<bool, StoreError> {
        self.saved.toggle(record)
    }

    pub fn is_saved(&self, id: &str) -> bool {
        self.saved.contains(id)
    }
}
