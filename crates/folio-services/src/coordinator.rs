//! Wires configuration, reconciliation and refresh into one "sync now" action.

use std::sync::Arc;

use folio_core::SyncSettings;

use crate::directory::GitHubDirectory;
use crate::error::SyncError;
use crate::reconcile::{ReconcileEngine, SyncReport};
use crate::refresh::RefreshBridge;
use crate::retry::RetryConfig;
use crate::store::{ProjectStore, SyncConfigStore};
use crate::sync_config::SyncConfigManager;

pub struct SyncCoordinator<S: SyncConfigStore + ProjectStore + ?Sized> {
    config: SyncConfigManager<S>,
    engine: ReconcileEngine<S>,
    bridge: RefreshBridge,
}

impl<S: SyncConfigStore + ProjectStore + ?Sized> SyncCoordinator<S> {
    pub fn new(store: Arc<S>, directory: GitHubDirectory, bridge: RefreshBridge) -> Self {
        Self {
            config: SyncConfigManager::new(Arc::clone(&store), directory.clone()),
            engine: ReconcileEngine::new(store, directory),
            bridge,
        }
    }

    /// Build with concurrency and metadata retries taken from settings
    pub fn from_settings(
        store: Arc<S>,
        directory: GitHubDirectory,
        bridge: RefreshBridge,
        settings: &SyncSettings,
    ) -> Self {
        let directory = directory.with_retry(RetryConfig::with_max_retries(settings.metadata_retries));
        let mut coordinator = Self::new(store, directory, bridge);
        coordinator.engine = coordinator.engine.with_max_concurrency(settings.max_concurrency);
        coordinator
    }

    pub fn config_manager(&self) -> &SyncConfigManager<S> {
        &self.config
    }

    pub fn bridge(&self) -> &RefreshBridge {
        &self.bridge
    }

    /// Run a sync for the configured account.
    ///
    /// On success the last-sync time is recorded and subscribers are told to
    /// reload. If recording the time fails the report is still returned, with
    /// `completed_at` left empty.
    ///
    /// # Errors
    /// `NotConfigured`, `SyncDisabled`, or `DirectoryUnavailable` when the
    /// repository list cannot be fetched. Nothing is written or published in
    /// those cases.
    pub async fn sync_now(&self) -> Result<SyncReport, SyncError> {
        let config = self
            .config
            .get_config()
            .await?
            .ok_or(SyncError::NotConfigured)?;
        if !config.sync_enabled {
            tracing::info!("Skipping sync for {}: sync is disabled", config.account_handle);
            return Err(SyncError::SyncDisabled);
        }

        let mut report = self
            .engine
            .sync(&config.account_handle, &config.selected_repos)
            .await?;

        match self.config.record_sync_completed().await {
            Ok(updated) => report.completed_at = updated.last_sync,
            Err(e) => tracing::warn!("Sync finished but last-sync time was not saved: {}", e),
        }

        self.bridge.publish();
        Ok(report)
    }
}
