//! GitHub account and repository selection management.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::directory::{AccountProfile, DirectoryRepo, GitHubDirectory};
use crate::error::SyncError;
use crate::records::SyncConfig;
use crate::store::SyncConfigStore;

/// Profile and repository list of the configured account, as last loaded
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub profile: AccountProfile,
    pub repos: Vec<DirectoryRepo>,
    pub loaded_at: DateTime<Utc>,
}

/// A repository offered in the selection dialog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoOption {
    pub name: String,
    pub description: Option<String>,
    pub stars: u32,
    pub language: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&DirectoryRepo> for RepoOption {
    fn from(repo: &DirectoryRepo) -> Self {
        Self {
            name: repo.name.clone(),
            description: repo.description.clone(),
            stars: repo.stargazers_count,
            language: repo.language.clone(),
            updated_at: repo.updated_at,
        }
    }
}

/// Owns the sync configuration singleton
pub struct SyncConfigManager<S: SyncConfigStore + ?Sized> {
    store: Arc<S>,
    directory: GitHubDirectory,
    snapshot: Arc<RwLock<Option<AccountSnapshot>>>,
}

impl<S: SyncConfigStore + ?Sized> Clone for SyncConfigManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            directory: self.directory.clone(),
            snapshot: Arc::clone(&self.snapshot),
        }
    }
}

impl<S: SyncConfigStore + ?Sized> SyncConfigManager<S> {
    pub fn new(store: Arc<S>, directory: GitHubDirectory) -> Self {
        Self {
            store,
            directory,
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// Current configuration, `None` if no account was ever configured
    pub async fn get_config(&self) -> Result<Option<SyncConfig>, SyncError> {
        Ok(self.store.get_sync_config().await?)
    }

    /// Bind the portfolio to a GitHub account.
    ///
    /// The account is checked live first; nothing is stored when it does not
    /// exist. The stored configuration is replaced with sync enabled and no
    /// last-sync. The account snapshot is then refreshed on a best-effort basis.
    ///
    /// # Errors
    /// `AccountNotFound` for unknown handles, `DirectoryUnavailable` when the
    /// existence check itself fails, `Store` when persisting fails.
    pub async fn configure(
        &self,
        handle: &str,
        selected: Vec<String>,
    ) -> Result<SyncConfig, SyncError> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(SyncError::AccountNotFound {
                handle: handle.to_string(),
            });
        }

        let exists = self
            .directory
            .account_exists(handle)
            .await
            .map_err(SyncError::DirectoryUnavailable)?;
        if !exists {
            tracing::info!("GitHub account {} does not exist", handle);
            return Err(SyncError::AccountNotFound {
                handle: handle.to_string(),
            });
        }

        let config = self
            .store
            .replace_sync_config(&SyncConfig::new(handle, selected))
            .await?;
        tracing::info!(
            "Configured GitHub sync for {} with {} selected repositories",
            config.account_handle,
            config.selected_repos.len()
        );

        if let Err(e) = self.load_account(handle).await {
            tracing::warn!("Configured {} but could not load account details: {}", handle, e);
        }

        Ok(config)
    }

    /// Replace the repository selection; last-sync is untouched
    pub async fn update_selection(&self, selected: Vec<String>) -> Result<SyncConfig, SyncError> {
        let config = self
            .store
            .update_selected_repos(&selected)
            .await?
            .ok_or(SyncError::NotConfigured)?;
        tracing::debug!("Selection updated to {:?}", config.selected_repos);
        Ok(config)
    }

    /// Stamp the configuration with the current time after a sync run
    pub async fn record_sync_completed(&self) -> Result<SyncConfig, SyncError> {
        self.store
            .update_last_sync(Utc::now())
            .await?
            .ok_or(SyncError::NotConfigured)
    }

    pub async fn set_sync_enabled(&self, enabled: bool) -> Result<SyncConfig, SyncError> {
        let config = self
            .store
            .set_sync_enabled(enabled)
            .await?
            .ok_or(SyncError::NotConfigured)?;
        tracing::info!("GitHub sync {}", if enabled { "enabled" } else { "disabled" });
        Ok(config)
    }

    /// Fetch profile and repository list concurrently and cache them
    pub async fn load_account(&self, handle: &str) -> Result<AccountSnapshot, SyncError> {
        let (profile, repos) =
            tokio::try_join!(self.directory.get_user(handle), self.directory.list_repos(handle))
                .map_err(|e| {
                    if e.is_not_found() {
                        SyncError::AccountNotFound {
                            handle: handle.to_string(),
                        }
                    } else {
                        SyncError::DirectoryUnavailable(e)
                    }
                })?;

        let snapshot = AccountSnapshot {
            profile,
            repos,
            loaded_at: Utc::now(),
        };
        *self.snapshot.write() = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// The most recently loaded account snapshot, if any
    pub fn account_snapshot(&self) -> Option<AccountSnapshot> {
        self.snapshot.read().clone()
    }

    /// Repositories the configured account can select from
    ///
    /// Uses the cached snapshot when it belongs to the configured account.
    pub async fn available_repos(&self) -> Result<Vec<RepoOption>, SyncError> {
        let config = self.get_config().await?.ok_or(SyncError::NotConfigured)?;

        let cached = self
            .account_snapshot()
            .filter(|s| s.profile.login.eq_ignore_ascii_case(&config.account_handle));
        let snapshot = match cached {
            Some(snapshot) => snapshot,
            None => self.load_account(&config.account_handle).await?,
        };

        Ok(snapshot.repos.iter().map(RepoOption::from).collect())
    }

    /// Most-starred repositories of the configured account
    pub async fn featured_repos(&self, limit: usize) -> Result<Vec<DirectoryRepo>, SyncError> {
        let config = self.get_config().await?.ok_or(SyncError::NotConfigured)?;
        self.directory
            .featured_repos(&config.account_handle, limit)
            .await
            .map_err(SyncError::DirectoryUnavailable)
    }
}
