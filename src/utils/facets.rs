//! Facet counts over a reconciled record set.

use std::collections::BTreeMap;

use crate::models::{Facets, Record};

fn bump(map: &mut BTreeMap<String, usize>, value: Option<&str>) {
    if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
        *map.entry(v.to_string()).or_default() += 1;
    }
}

/// Count observed values per dimension. Absent or empty values are skipped;
/// language is counted case-insensitively and each provider in `sources`
/// counts once per record.
pub fn build_facets(records: &[Record]) -> Facets {
    let mut facets = Facets::default();

    for record in records {
        if let Some(year) = record.year {
            *facets.year.entry(year).or_default() += 1;
        }
        bump(
            &mut facets.language,
            record.language.as_deref().map(str::to_lowercase).as_deref(),
        );
        for provider in &record.sources {
            *facets.source.entry(*provider).or_default() += 1;
        }
        bump(&mut facets.study_type, record.study_type.as_deref());
        bump(&mut facets.method, record.method.as_deref());
        bump(&mut facets.population, record.population.as_deref());
    }

    facets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provider, RecordBuilder};

    fn with_language(id: &str, language: &str) -> Record {
        RecordBuilder::new(id, id, Provider::Doaj)
            .language(Some(language.to_string()))
            .build()
    }

    #[test]
    fn test_language_counts() {
        let records = vec![
            with_language("a", "en"),
            with_language("b", "EN"),
            with_language("c", "pt"),
        ];
        let facets = build_facets(&records);
        assert_eq!(
            facets.language,
            BTreeMap::from([("en".to_string(), 2), ("pt".to_string(), 1)])
        );
    }

    #[test]
    fn test_sources_count_per_member() {
        let merged = RecordBuilder::new("10.1/x", "T", Provider::Crossref)
            .source(Provider::Doaj)
            .year(Some(2020))
            .build();
        let single = RecordBuilder::new("pubmed:1", "U", Provider::PubMed)
            .year(Some(2020))
            .build();

        let facets = build_facets(&[merged, single]);
        assert_eq!(facets.source.get(&Provider::Crossref), Some(&1));
        assert_eq!(facets.source.get(&Provider::Doaj), Some(&1));
        assert_eq!(facets.source.get(&Provider::PubMed), Some(&1));
        assert_eq!(facets.year, BTreeMap::from([(2020, 2)]));
    }

    #[test]
    fn test_absent_values_skipped() {
        let bare = RecordBuilder::new("doaj:1", "T", Provider::Doaj).build();
        let labelled = RecordBuilder::new("doaj:2", "U", Provider::Doaj)
            .study_type(Some("Review".to_string()))
            .method(Some("Qualitative".to_string()))
            .population(Some("Adults".to_string()))
            .build();

        let facets = build_facets(&[bare, labelled]);
        assert!(facets.year.is_empty());
        assert!(facets.language.is_empty());
        assert_eq!(facets.study_type.get("Review"), Some(&1));
        assert_eq!(facets.method.get("Qualitative"), Some(&1));
        assert_eq!(facets.population.get("Adults"), Some(&1));
        assert_eq!(facets.dimension_sizes()[2], ("source", 1));
    }

    #[test]
    fn test_empty_input() {
        assert!(build_facets(&[]).is_empty());
    }
}
