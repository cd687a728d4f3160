//! Record model: the normalized unit every provider response is mapped into.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The bibliographic provider a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Crossref,
    PubMed,
    Doaj,
}

impl Provider {
    /// All providers, in fan-out order
    pub const ALL: [Provider; 3] = [Provider::Crossref, Provider::PubMed, Provider::Doaj];

    /// Returns the display name of the provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Crossref => "Crossref",
            Provider::PubMed => "PubMed",
            Provider::Doaj => "DOAJ",
        }
    }

    /// Returns the provider identifier (used for error keys and ids)
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Crossref => "crossref",
            Provider::PubMed => "pubmed",
            Provider::Doaj => "doaj",
        }
    }

    /// Parse a provider from its id or display name
    pub fn from_id(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "crossref" => Some(Provider::Crossref),
            "pubmed" => Some(Provider::PubMed),
            "doaj" => Some(Provider::Doaj),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A normalized bibliographic record
///
/// Created once by an adapter from one provider item. The reconciler never
/// mutates a record in place; it either passes it through or builds a new
/// merged record. A saved item is a plain snapshot of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// DOI (lowercased, trimmed) when present, else `<provider>:<native-id>`
    pub id: String,

    pub title: String,

    /// Display names in provider order
    #[serde(default)]
    pub authors: Vec<String>,

    pub year: Option<i32>,

    #[serde(default)]
    pub journal: String,

    pub doi: Option<String>,

    /// Plain text, tags stripped and whitespace collapsed
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,

    /// Provider-asserted open access flag
    #[serde(default)]
    pub oa: bool,

    pub language: Option<String>,

    pub url: Option<String>,

    /// Study type label
    #[serde(rename = "type")]
    pub study_type: Option<String>,

    pub method: Option<String>,

    pub population: Option<String>,

    /// Providers that contributed to this record
    #[serde(default)]
    pub sources: BTreeSet<Provider>,
}

impl Record {
    /// Create a record with its identity fields; everything else starts empty
    pub fn new(id: impl Into<String>, title: impl Into<String>, provider: Provider) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            year: None,
            journal: String::new(),
            doi: None,
            abstract_text: String::new(),
            oa: false,
            language: None,
            url: None,
            study_type: None,
            method: None,
            population: None,
            sources: BTreeSet::from([provider]),
        }
    }

    /// First author, if any
    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(|s| s.as_str())
    }

    /// Link to the work: the canonical URL, else the DOI resolver
    pub fn link(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| self.doi.as_ref().map(|doi| format!("https://doi.org/{}", doi)))
    }

    /// Provider display names, joined for presentation
    pub fn source_names(&self) -> String {
        self.sources
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Derive the record identity: the normalized DOI when present, else a
/// provider-qualified native id.
pub fn record_id(doi: Option<&str>, provider: Provider, native_id: &str) -> String {
    match doi.map(|d| d.trim().to_lowercase()).filter(|d| !d.is_empty()) {
        Some(doi) => doi,
        None => format!("{}:{}", provider.id(), native_id),
    }
}

/// Builder for constructing Record objects
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Create a new builder with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>, provider: Provider) -> Self {
        Self {
            record: Record::new(id, title, provider),
        }
    }

    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.record.authors = authors;
        self
    }

    pub fn year(mut self, year: Option<i32>) -> Self {
        self.record.year = year;
        self
    }

    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.record.journal = journal.into();
        self
    }

    /// Set DOI; blank values are treated as absent
    pub fn doi(mut self, doi: Option<String>) -> Self {
        self.record.doi = doi
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }

    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.record.abstract_text = abstract_text.into();
        self
    }

    pub fn oa(mut self, oa: bool) -> Self {
        self.record.oa = oa;
        self
    }

    pub fn language(mut self, language: Option<String>) -> Self {
        self.record.language = language.filter(|l| !l.trim().is_empty());
        self
    }

    pub fn url(mut self, url: Option<String>) -> Self {
        self.record.url = url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn study_type(mut self, study_type: Option<String>) -> Self {
        self.record.study_type = study_type.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn method(mut self, method: Option<String>) -> Self {
        self.record.method = method;
        self
    }

    pub fn population(mut self, population: Option<String>) -> Self {
        self.record.population = population;
        self
    }

    /// Add another contributing provider
    pub fn source(mut self, provider: Provider) -> Self {
        self.record.sources.insert(provider);
        self
    }

    /// Build the Record
    pub fn build(self) -> Record {
        self.record
    }
}
