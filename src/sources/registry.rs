//! Registry of provider adapters.

use std::sync::Arc;

use super::{CrossrefSource, DoajSource, PubMedSource, Source, SourceError};
use crate::config::Config;
use crate::models::Provider;
use crate::utils::HttpClient;

bitflags::bitflags! {
    /// Capabilities that a source can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const SEARCH = 1 << 0;
        const HEALTH_CHECK = 1 << 1;
        /// Returns abstracts in search results
        const ABSTRACTS = 1 << 2;
        /// Every record is open access
        const OPEN_ACCESS = 1 << 3;
    }
}

/// Ordered set of adapters the orchestrator fans out to
///
/// Registration order is preserved; it decides which record supplies the
/// defaults when results are merged.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with Crossref, PubMed and DOAJ built from configuration,
    /// sharing one HTTP client
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = HttpClient::from_config(&config.http)?;

        let mut registry = Self::empty();
        registry.register(Arc::new(CrossrefSource::from_config(config, client.clone())));
        registry.register(Arc::new(PubMedSource::from_config(config, client.clone())));
        registry.register(Arc::new(DoajSource::from_config(config, client)));
        Ok(registry)
    }

    /// Register a source, replacing any existing one for the same provider
    pub fn register(&mut self, source: Arc<dyn Source>) {
        let provider = source.provider();
        match self.sources.iter().position(|s| s.provider() == provider) {
            Some(i) => self.sources[i] = source,
            None => self.sources.push(source),
        }
    }

    /// Get the source for a provider
    pub fn get(&self, provider: Provider) -> Option<&Arc<dyn Source>> {
        self.sources.iter().find(|s| s.provider() == provider)
    }

    /// All registered sources in registration order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Get sources that support a specific capability
    pub fn with_capability(&self, capability: SourceCapabilities) -> Vec<&Arc<dyn Source>> {
        self.all()
            .filter(|s| s.capabilities().contains(capability))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
