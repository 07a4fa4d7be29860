use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// GitHub repository directory settings
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Persistent store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Contact-form email delivery
    #[serde(default)]
    pub email: EmailConfig,

    /// Repository sync tuning
    #[serde(default)]
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the GitHub REST API
    #[serde(default = "default_directory_api_url")]
    pub api_url: String,

    /// Optional personal access token; raises the anonymous rate limit.
    /// Read from `FOLIO_GITHUB_TOKEN` when absent from the file.
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_directory_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            api_url: default_directory_api_url(),
            token: std::env::var("FOLIO_GITHUB_TOKEN").ok(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Which persistent store backs the portfolio content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Local SQLite file
    #[default]
    Sqlite,
    /// Hosted database exposed through a PostgREST-compatible API
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// SQLite database path; defaults to `<config_dir>/folio.db`
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,

    /// Project URL of the hosted database (REST backend)
    #[serde(default)]
    pub rest_url: Option<String>,

    /// API key for the hosted database. Read from `FOLIO_STORE_API_KEY`
    /// when absent from the file.
    #[serde(default)]
    pub rest_api_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            sqlite_path: None,
            rest_url: None,
            rest_api_key: std::env::var("FOLIO_STORE_API_KEY").ok(),
        }
    }
}

impl StoreConfig {
    /// Resolve the SQLite path, falling back to a file in `config_dir`.
    pub fn effective_sqlite_path(&self, config_dir: &Path) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| config_dir.join("folio.db"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Form-delivery endpoint that forwards contact messages by email
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Address shown as the intended recipient
    #[serde(default)]
    pub to_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Repositories reconciled concurrently (default: 4)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Retries for per-repository language lookups (default: 2)
    #[serde(default = "default_metadata_retries")]
    pub metadata_retries: u32,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_metadata_retries() -> u32 {
    2
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            metadata_retries: default_metadata_retries(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("folio");

        Self {
            config_dir,
            directory: DirectoryConfig::default(),
            store: StoreConfig::default(),
            email: EmailConfig::default(),
            sync: SyncSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating a default file
    /// there if it doesn't exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!("Configuration validation failed: {}", validation.error_summary());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.directory.api_url, "directory.api_url", &mut result);

        if self.directory.timeout_secs == 0 {
            result.add_error("directory.timeout_secs", "Timeout must be greater than 0");
        }

        if self.directory.token.is_none() {
            result.add_warning(
                "directory.token",
                "No GitHub token configured - anonymous rate limits apply",
            );
        }

        if self.store.backend == StoreBackend::Rest {
            match &self.store.rest_url {
                Some(url) => self.validate_url(url, "store.rest_url", &mut result),
                None => result.add_error("store.rest_url", "REST backend requires a URL"),
            }
            if self.store.rest_api_key.is_none() {
                result.add_error("store.rest_api_key", "REST backend requires an API key");
            }
        }

        match &self.email.endpoint {
            Some(endpoint) => self.validate_url(endpoint, "email.endpoint", &mut result),
            None => result.add_warning(
                "email.endpoint",
                "No email endpoint configured - contact messages will only be stored",
            ),
        }

        if self.sync.max_concurrency == 0 {
            result.add_error("sync.max_concurrency", "Concurrency must be at least 1");
        } else if self.sync.max_concurrency > 32 {
            result.add_warning(
                "sync.max_concurrency",
                "High concurrency may trigger GitHub secondary rate limits",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("folio");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_directory_url() {
        let mut config = Config::default();
        config.directory.api_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "directory.api_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.directory.api_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_rest_backend_requires_url_and_key() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Rest;
        config.store.rest_url = None;
        config.store.rest_api_key = None;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "store.rest_url"));
        assert!(result.errors.iter().any(|e| e.field == "store.rest_api_key"));
    }

    #[test]
    fn test_zero_concurrency_is_error() {
        let mut config = Config::default();
        config.sync.max_concurrency = 0;
        let result = config.validate();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_missing_email_endpoint_is_warning() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "email.endpoint"));
    }

    #[test]
    fn test_load_from_creates_default_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut created = Config::load_from(&path).unwrap();
        assert!(path.exists());

        created.sync.max_concurrency = 9;
        created.store.sqlite_path = Some(dir.path().join("content.db"));
        created.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.sync.max_concurrency, 9);
        assert_eq!(
            loaded.store.effective_sqlite_path(&loaded.config_dir),
            dir.path().join("content.db")
        );
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "config_dir = \"/tmp/folio\"\n\n[store]\nbackend = \"rest\"\n")
            .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Rest);
        assert_eq!(config.directory.api_url, "https://api.github.com");
        assert_eq!(config.sync.max_concurrency, 4);
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
