//! # psisearch
//!
//! A literature search aggregator that queries Crossref, PubMed and DOAJ at
//! once, classifies each record (study type, method, population), merges
//! duplicates across providers and summarizes the result set as facets.
//!
//! ## Architecture
//!
//! - [`models`]: records, queries, filters and search outcomes
//! - [`sources`]: provider adapters behind the [`Source`] trait
//! - [`search`]: the orchestrator and the stateful search session
//! - [`utils`]: classification, reconciliation, facets, filters, HTTP, saved list, BibTeX
//! - [`mcp`]: MCP server exposing search and the saved list as tools
//! - [`config`]: configuration management
//! - [`ui`]: terminal presentation helpers

pub mod config;
pub mod mcp;
pub mod models;
pub mod search;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{Provider, Record, SearchFilters, SearchOutcome, SearchParams, SearchQuery};
pub use search::{Orchestrator, SearchSession};
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
