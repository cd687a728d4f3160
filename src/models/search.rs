//! Search request and outcome models.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Provider, Record};

/// Year used when `year_from` is absent or unparsable
pub const DEFAULT_YEAR_FROM: i32 = 2019;

/// Year used when `year_to` is absent or unparsable
pub const DEFAULT_YEAR_TO: i32 = 2025;

/// Parse a year input, falling back to `default` when it is absent,
/// unparsable, or zero. Malformed input is never an error.
pub fn parse_year_or(value: Option<&str>, default: i32) -> i32 {
    value
        .and_then(|v| v.trim().parse::<i32>().ok())
        .filter(|year| *year != 0)
        .unwrap_or(default)
}

/// What every adapter receives: free text plus an inclusive year range.
///
/// `year_from <= year_to` is not enforced here; that is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query, possibly empty
    pub q: String,

    pub year_from: i32,

    pub year_to: i32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            q: String::new(),
            year_from: DEFAULT_YEAR_FROM,
            year_to: DEFAULT_YEAR_TO,
        }
    }
}

impl SearchQuery {
    /// Create a new search query over the default year range
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into().trim().to_string(),
            ..Default::default()
        }
    }

    /// Set the inclusive year range
    pub fn years(mut self, year_from: i32, year_to: i32) -> Self {
        self.year_from = year_from;
        self.year_to = year_to;
        self
    }
}

/// User-selected constraints applied after reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Accepted language codes (lowercase); empty means no language filtering
    #[serde(default)]
    pub languages: BTreeSet<String>,

    /// Keep only open-access records
    #[serde(default)]
    pub oa_only: bool,
}

impl SearchFilters {
    /// Accept the given language codes; blanks are ignored
    pub fn languages<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.languages = codes
            .into_iter()
            .map(|c| c.as_ref().trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        self
    }

    /// Set the open-access constraint
    pub fn oa_only(mut self, oa_only: bool) -> Self {
        self.oa_only = oa_only;
        self
    }
}

/// The raw query-parameter surface, as received from a form or remote request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,

    #[serde(default)]
    pub year_from: Option<String>,

    #[serde(default)]
    pub year_to: Option<String>,

    #[serde(default)]
    pub lang: Vec<String>,

    #[serde(default)]
    pub oa: bool,
}

impl SearchParams {
    /// Resolve into a query and filters using the built-in default years
    pub fn resolve(&self) -> (SearchQuery, SearchFilters) {
        self.resolve_with_defaults(DEFAULT_YEAR_FROM, DEFAULT_YEAR_TO)
    }

    /// Resolve into a query and filters, substituting the given default years
    pub fn resolve_with_defaults(
        &self,
        default_from: i32,
        default_to: i32,
    ) -> (SearchQuery, SearchFilters) {
        let query = SearchQuery::new(&self.q).years(
            parse_year_or(self.year_from.as_deref(), default_from),
            parse_year_or(self.year_to.as_deref(), default_to),
        );
        let filters = SearchFilters::default()
            .languages(&self.lang)
            .oa_only(self.oa);
        (query, filters)
    }
}

/// Value-to-count summaries per categorical dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    pub year: BTreeMap<i32, usize>,
    pub language: BTreeMap<String, usize>,
    pub source: BTreeMap<Provider, usize>,
    #[serde(rename = "type")]
    pub study_type: BTreeMap<String, usize>,
    pub method: BTreeMap<String, usize>,
    pub population: BTreeMap<String, usize>,
}

impl Facets {
    /// Number of distinct values per dimension, in display order
    pub fn dimension_sizes(&self) -> [(&'static str, usize); 6] {
        [
            ("year", self.year.len()),
            ("language", self.language.len()),
            ("source", self.source.len()),
            ("type", self.study_type.len()),
            ("method", self.method.len()),
            ("population", self.population.len()),
        ]
    }

    /// True when no dimension has any value
    pub fn is_empty(&self) -> bool {
        self.dimension_sizes().iter().all(|(_, n)| *n == 0)
    }
}

/// Result of one search invocation
///
/// Adapter failures land in `errors`; zero records with errors for every
/// provider is still a valid outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub records: Vec<Record>,

    /// Failure description per failed provider
    pub errors: BTreeMap<Provider, String>,

    pub facets: Facets,

    /// Effective query after year fallback
    pub query: SearchQuery,

    /// Search generation that produced this outcome
    #[serde(default)]
    pub generation: u64,
}

impl SearchOutcome {
    /// Whether any provider failed
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the result set is empty (from all-failure or all-empty)
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
