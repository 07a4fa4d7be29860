use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{Config, ValidationResult};

/// Application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
    validation: ValidationResult,
}

impl App {
    /// Create a new application instance from the on-disk configuration
    pub fn new() -> Result<Self> {
        let (config, validation) = Config::load_validated()?;
        Ok(Self::with_config(config, validation))
    }

    /// Create an application instance from an already loaded configuration
    pub fn with_config(config: Config, validation: ValidationResult) -> Self {
        Self {
            config: Arc::new(config),
            validation,
        }
    }

    /// Ensure the data directory exists before any store is opened
    pub fn initialize(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.config_dir)?;
        tracing::info!(
            config_dir = %self.config.config_dir.display(),
            backend = ?self.config.store.backend,
            warnings = self.validation.warnings.len(),
            "Application initialized"
        );
        Ok(())
    }

    /// Shutdown the application
    pub fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down application");
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the configuration
    pub fn shared_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Path of the local SQLite database (used by the sqlite backend)
    pub fn sqlite_path(&self) -> PathBuf {
        self.config
            .store
            .effective_sqlite_path(&self.config.config_dir)
    }

    /// Validation warnings collected while loading the configuration
    pub fn warnings(&self) -> &[crate::config::ConfigValidationError] {
        &self.validation.warnings
    }
}
