//! Post-reconciliation filters.
//!
//! Both predicates are per-record and independent, so the order they run in
//! does not change the result.

use crate::models::{Record, SearchFilters};

/// Unknown language always passes; otherwise the lowercased language must be
/// accepted. An empty accepted set disables the filter.
pub fn language_matches(record: &Record, filters: &SearchFilters) -> bool {
    if filters.languages.is_empty() {
        return true;
    }
    match record.language.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(lang) => filters.languages.contains(&lang.to_lowercase()),
    }
}

/// Passes every record unless open-access only was requested
pub fn oa_matches(record: &Record, filters: &SearchFilters) -> bool {
    !filters.oa_only || record.oa
}

/// Keep the records that pass both predicates, preserving order
pub fn apply_filters(records: Vec<Record>, filters: &SearchFilters) -> Vec<Record> {
    records
        .into_iter()
        .filter(|r| language_matches(r, filters) && oa_matches(r, filters))
        .collect()
}
