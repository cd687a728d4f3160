//! Configuration management.
//!
//! Settings come from an optional TOML file layered under environment
//! variables prefixed with `PSISEARCH_`. Nested keys use a double
//! underscore, e.g. `PSISEARCH_HTTP__TIMEOUT_SECS=30`.

mod file_config;

pub use file_config::{default_config_path, save_config, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::{DEFAULT_YEAR_FROM, DEFAULT_YEAR_TO};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PSISEARCH";

/// Config file name looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "psisearch.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Provider base URLs
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry and backoff settings
    #[serde(default)]
    pub retry: RetrySettings,

    /// Search defaults
    #[serde(default)]
    pub search: SearchDefaults,

    /// Saved list storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Base URLs of the three providers. Overridable so tests can point the
/// adapters at a local mock server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_crossref")]
    pub crossref: String,

    #[serde(default = "default_pubmed_esearch")]
    pub pubmed_esearch: String,

    #[serde(default = "default_pubmed_esummary")]
    pub pubmed_esummary: String,

    #[serde(default = "default_doaj")]
    pub doaj: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            crossref: default_crossref(),
            pubmed_esearch: default_pubmed_esearch(),
            pubmed_esummary: default_pubmed_esummary(),
            doaj: default_doaj(),
        }
    }
}

fn default_crossref() -> String {
    "https://api.crossref.org".to_string()
}

fn default_pubmed_esearch() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi".to_string()
}

fn default_pubmed_esummary() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi".to_string()
}

fn default_doaj() -> String {
    "https://doaj.org/api/v2/search/articles".to_string()
}

/// An endpoint that is not an absolute http(s) URL
#[derive(Debug, thiserror::Error)]
#[error("invalid {name} endpoint '{url}': {reason}")]
pub struct InvalidEndpoint {
    pub name: &'static str,
    pub url: String,
    pub reason: String,
}

impl EndpointsConfig {
    /// Check that every base URL parses and uses http or https
    pub fn validate(&self) -> Result<(), InvalidEndpoint> {
        let endpoints = [
            ("crossref", &self.crossref),
            ("pubmed_esearch", &self.pubmed_esearch),
            ("pubmed_esummary", &self.pubmed_esummary),
            ("doaj", &self.doaj),
        ];
        for (name, url) in endpoints {
            let invalid = |reason: String| InvalidEndpoint {
                name,
                url: url.clone(),
                reason,
            };
            let parsed = url::Url::parse(url).map_err(|e| invalid(e.to_string()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(invalid(format!("unsupported scheme {}", parsed.scheme())));
            }
        }
        Ok(())
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Overrides the `psisearch/<version>` user agent
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Contact address sent to NCBI E-utilities
    #[serde(default = "default_contact_email")]
    pub contact_email: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: None,
            contact_email: default_contact_email(),
        }
    }
}

fn default_timeout() -> u64 {
    20
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_contact_email() -> String {
    "psisearch@example.com".to_string()
}

/// Retry configuration as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    5_000
}

/// Defaults substituted for missing or malformed year inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDefaults {
    #[serde(default = "default_year_from")]
    pub default_year_from: i32,

    #[serde(default = "default_year_to")]
    pub default_year_to: i32,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            default_year_from: DEFAULT_YEAR_FROM,
            default_year_to: DEFAULT_YEAR_TO,
        }
    }
}

fn default_year_from() -> i32 {
    DEFAULT_YEAR_FROM
}

fn default_year_to() -> i32 {
    DEFAULT_YEAR_TO
}

/// Saved list storage configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the saved list; the platform data dir when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl StorageConfig {
    /// Effective storage directory
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("psisearch"))
                .unwrap_or_else(|| PathBuf::from(".psisearch"))
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` for structured output, plain text otherwise
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn build(path: Option<&Path>, env: config::Environment) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(true));
    }
    let settings = builder.add_source(env).build()?;
    let loaded: Config = settings.try_deserialize()?;
    loaded
        .endpoints
        .validate()
        .map_err(|e| config::ConfigError::Message(e.to_string()))?;
    Ok(loaded)
}

/// Load configuration from an explicit file, or the first discovered one,
/// with environment overrides on top
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let discovered = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config_file(),
    };
    if let Some(p) = &discovered {
        tracing::debug!("Loading configuration from {}", p.display());
    }
    build(discovered.as_deref(), environment())
}

/// First existing config file among `./psisearch.toml` and
/// `<config_dir>/psisearch/config.toml`
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    default_config_path().filter(|p| p.is_file())
}

/// Configuration from the environment only
pub fn get_config() -> Config {
    build(None, environment()).unwrap_or_else(|e| {
        tracing::warn!("Ignoring invalid environment configuration: {}", e);
        Config::default()
    })
}
