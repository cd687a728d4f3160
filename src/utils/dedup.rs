//! Reconciliation of records that describe the same work.
//!
//! Records are grouped by merge key in first-seen order. Groups with more
//! than one member are folded left to right: the first member supplies the
//! defaults and later members only fill gaps.

use std::collections::HashMap;

use super::text::normalize_title;
use crate::models::Record;

/// Identity used to decide whether two records describe the same work.
///
/// The trimmed, lowercased DOI when present, else the normalized title
/// joined with the year (empty when the year is unknown).
pub fn merge_key(record: &Record) -> String {
    if let Some(doi) = record
        .doi
        .as_deref()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
    {
        return doi;
    }

    let year = record.year.map(|y| y.to_string()).unwrap_or_default();
    format!("{}|{}", normalize_title(&record.title), year)
}

/// Merge duplicate records, keeping first-seen key order
pub fn reconcile(records: Vec<Record>) -> Vec<Record> {
    if records.len() <= 1 {
        return records;
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<Record>> = Vec::new();

    for record in records {
        let key = merge_key(&record);
        match index.get(&key) {
            Some(&i) => groups[i].push(record),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![record]);
            }
        }
    }

    groups
        .into_iter()
        .filter_map(|group| {
            let mut members = group.into_iter();
            let first = members.next()?;
            Some(members.fold(first, merge))
        })
        .collect()
}

fn fill_string(acc: String, next: String) -> String {
    if acc.trim().is_empty() {
        next
    } else {
        acc
    }
}

fn fill_option<T>(acc: Option<T>, next: Option<T>) -> Option<T> {
    acc.or(next)
}

/// Fold one record into the accumulator: fill gaps, union provenance
fn merge(acc: Record, next: Record) -> Record {
    let mut sources = acc.sources;
    sources.extend(next.sources);

    Record {
        id: fill_string(acc.id, next.id),
        title: fill_string(acc.title, next.title),
        authors: if acc.authors.is_empty() {
            next.authors
        } else {
            acc.authors
        },
        year: fill_option(acc.year, next.year),
        journal: fill_string(acc.journal, next.journal),
        doi: fill_option(acc.doi, next.doi),
        abstract_text: fill_string(acc.abstract_text, next.abstract_text),
        oa: acc.oa || next.oa,
        language: fill_option(acc.language, next.language),
        url: fill_option(acc.url, next.url),
        study_type: fill_option(acc.study_type, next.study_type),
        method: fill_option(acc.method, next.method),
        population: fill_option(acc.population, next.population),
        sources,
    }
}
