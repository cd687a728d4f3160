//! Utility modules supporting the search pipeline.
//!
//! - [`classify`]: infer study type, method and population from record text
//! - [`reconcile`]: merge records that describe the same work
//! - [`build_facets`]: value counts per dimension
//! - [`apply_filters`]: language and open-access predicates
//! - [`HttpClient`]: shared HTTP client built from configuration
//! - [`with_retry`]: execute an operation with retry on transient errors
//! - [`SavedList`]: persisted list of saved records over a [`KeyValueStore`]
//! - [`to_bibtex`]: BibTeX rendering of a record
//!
//! # Pipeline
//!
//! ```rust
//! use psisearch::models::{Provider, RecordBuilder, SearchFilters};
//! use psisearch::utils::{apply_filters, build_facets, classify, reconcile};
//!
//! let records = vec![
//!     classify(RecordBuilder::new("10.1/x", "A randomized trial", Provider::Crossref)
//!         .doi(Some("10.1/x".to_string()))
//!         .build()),
//!     classify(RecordBuilder::new("10.1/x", "A randomized trial", Provider::Doaj)
//!         .doi(Some("10.1/X".to_string()))
//!         .oa(true)
//!         .build()),
//! ];
//!
//! let merged = apply_filters(reconcile(records), &SearchFilters::default().oa_only(true));
//! assert_eq!(merged.len(), 1);
//! assert_eq!(build_facets(&merged).source.len(), 2);
//! ```

mod classify;
mod cite;
mod dedup;
mod facets;
mod filter;
mod http;
mod retry;
mod store;
mod text;

pub use classify::classify;
pub use cite::{citation_key, to_bibtex, to_bibtex_all};
pub use dedup::{merge_key, reconcile};
pub use facets::build_facets;
pub use filter::{apply_filters, language_matches, oa_matches};
pub use http::{HttpClient, USER_AGENT};
pub use retry::{with_retry, RetryConfig, TransientError};
pub use store::{FileStore, KeyValueStore, MemoryStore, SavedList, StoreError, STORAGE_KEY};
pub use text::{
    clean_abstract, collapse_whitespace, escape_doaj_query, first_year, map_language,
    map_language_opt, normalize_title,
};
