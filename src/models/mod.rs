//! Core data models for records and search operations.

mod record;
mod search;

pub use record::{record_id, Provider, Record, RecordBuilder};
pub use search::{
    parse_year_or, Facets, SearchFilters, SearchOutcome, SearchParams, SearchQuery,
    DEFAULT_YEAR_FROM, DEFAULT_YEAR_TO,
};
