//! BibTeX citation formatting.

use crate::models::Record;

/// Citation key: the first whitespace token of the first author, lowercased
/// and stripped of punctuation (or `ref`), followed by the year.
pub fn citation_key(record: &Record) -> String {
    let token: String = record
        .first_author()
        .and_then(|a| a.split_whitespace().next())
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    let stem = if token.is_empty() { "ref".to_string() } else { token };
    let year = record.year.map(|y| y.to_string()).unwrap_or_default();
    format!("{}{}", stem, year)
}

/// Generate a BibTeX entry
/// Format: @article{key,
///   title={Title},
///   author={First Author and Second Author},
///   journal={Journal},
///   year={Year},
///   doi={DOI}
/// }
pub fn to_bibtex(record: &Record) -> String {
    format!(
        "@article{{{},\n  title={{{}}},\n  author={{{}}},\n  journal={{{}}},\n  year={{{}}},\n  doi={{{}}}\n}}",
        citation_key(record),
        record.title,
        record.authors.join(" and "),
        record.journal,
        record.year.map(|y| y.to_string()).unwrap_or_default(),
        record.doi.as_deref().unwrap_or(""),
    )
}

/// Concatenate entries, separated by blank lines
pub fn to_bibtex_all<'a>(records: impl IntoIterator<Item = &'a Record>) -> String {
    records
        .into_iter()
        .map(to_bibtex)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provider, RecordBuilder};

    #[test]
    fn test_bibtex_entry() {
        let record = RecordBuilder::new("10.1/x", "Cancer Screening", Provider::PubMed)
            .authors(vec!["Smith J".to_string(), "Doe A".to_string()])
            .journal("Oncology Reports")
            .year(Some(2020))
            .doi(Some("10.1/X".to_string()))
            .build();

        let bib = to_bibtex(&record);
        assert!(bib.starts_with("@article{smith2020,\n"));
        assert!(bib.contains("  title={Cancer Screening},\n"));
        assert!(bib.contains("  author={Smith J and Doe A},\n"));
        assert!(bib.contains("  journal={Oncology Reports},\n"));
        assert!(bib.contains("  year={2020},\n"));
        assert!(bib.ends_with("  doi={10.1/X}\n}"));
    }

    #[test]
    fn test_key_strips_punctuation() {
        let record = RecordBuilder::new("crossref:1", "T", Provider::Crossref)
            .authors(vec!["Doe, John".to_string()])
            .year(Some(2021))
            .build();
        assert_eq!(citation_key(&record), "doe2021");
    }

    #[test]
    fn test_missing_fields() {
        let record = RecordBuilder::new("doaj:1", "Untitled", Provider::Doaj).build();
        assert_eq!(citation_key(&record), "ref");
        let bib = to_bibtex(&record);
        assert!(bib.contains("author={}"));
        assert!(bib.contains("year={}"));
        assert!(bib.contains("doi={}"));
    }

    #[test]
    fn test_bibtex_all() {
        let a = RecordBuilder::new("a", "A", Provider::Doaj).build();
        let b = RecordBuilder::new("b", "B", Provider::Doaj).build();
        let all = to_bibtex_all([&a, &b]);
        assert_eq!(all.matches("@article{").count(), 2);
        assert!(all.contains("}\n\n@article{"));
    }
}
