pub mod app;
pub mod config;
pub mod error;

pub use app::App;
pub use config::{
    Config, DirectoryConfig, EmailConfig, StoreBackend, StoreConfig, SyncSettings,
    ValidationResult,
};
pub use error::{
    AppError, ConfigError, DatabaseError, DeliveryError, GitHubError, NetworkError,
    ReqwestErrorExt, RusqliteErrorExt,
};

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    // Initialize tracing/logging; a second call keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    tracing::info!("Folio core initialized");
    Ok(())
}
