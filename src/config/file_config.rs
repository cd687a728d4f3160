//! TOML configuration file support.
//!
//! # Configuration File Format
//!
//! ```toml
//! [endpoints]
//! crossref = "https://api.crossref.org"
//! pubmed_esearch = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi"
//! pubmed_esummary = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi"
//! doaj = "https://doaj.org/api/v2/search/articles"
//!
//! [http]
//! timeout_secs = 20
//! connect_timeout_secs = 10
//! contact_email = "psisearch@example.com"
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 500
//! max_delay_ms = 5000
//!
//! [search]
//! default_year_from = 2019
//! default_year_to = 2025
//!
//! [storage]
//! directory = "~/.local/share/psisearch"
//!
//! [logging]
//! level = "warn"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};

use super::Config;

/// Platform config location: `<config_dir>/psisearch/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("psisearch").join("config.toml"))
}

impl Config {
    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))
    }

    /// Parse a TOML document; missing sections take their defaults
    pub fn from_toml(content: &str) -> Result<Self, ConfigFileError> {
        toml::from_str(content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }
}

/// Write configuration to a TOML file, creating parent directories
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigFileError> {
    let content = config.to_toml()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }

    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
