// crates/folio-services/src/project_view.rs

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::records::{ProjectRecord, ProjectStatus};
use crate::refresh::{RefreshBridge, Subscription};
use crate::store::{ProjectStore, StoreError, StoreResult, SyncConfigStore};

/// Supplies the project list shown on the public page
pub struct ProjectCatalog<S: SyncConfigStore + ProjectStore + ?Sized> {
    store: Arc<S>,
    fallback_reads: Arc<AtomicU64>,
}

impl<S: SyncConfigStore + ProjectStore + ?Sized> Clone for ProjectCatalog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            fallback_reads: Arc::clone(&self.fallback_reads),
        }
    }
}

impl<S: SyncConfigStore + ProjectStore + ?Sized> ProjectCatalog<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            fallback_reads: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Projects for the currently selected repositories, newest first.
    ///
    /// Empty when sync is unconfigured or nothing is selected. If the
    /// selection-aware read fails, every project is returned instead and the
    /// degradation is logged and counted.
    ///
    /// # Errors
    /// Only when the unfiltered fallback read fails as well.
    pub async fn list_visible_projects(&self) -> StoreResult<Vec<ProjectRecord>> {
        match self.selected_projects().await {
            Ok(projects) => Ok(projects),
            Err(e) => {
                let count = self.fallback_reads.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    "Selected-project read failed, showing all projects (fallback #{}): {}",
                    count,
                    e
                );
                self.store.list_projects().await
            }
        }
    }

    async fn selected_projects(&self) -> StoreResult<Vec<ProjectRecord>> {
        let Some(config) = self.store.get_sync_config().await? else {
            return Ok(Vec::new());
        };
        if !config.has_selection() {
            return Ok(Vec::new());
        }
        self.store.list_projects_named(&config.selected_repos).await
    }

    /// Visible projects narrowed by the page's filters
    pub async fn list_filtered(&self, filter: &ProjectFilter) -> StoreResult<Vec<ProjectRecord>> {
        Ok(filter.apply(self.list_visible_projects().await?))
    }

    /// Times the unfiltered fallback was served
    pub fn fallback_reads(&self) -> u64 {
        self.fallback_reads.load(Ordering::Relaxed)
    }
}

/// Technology and status filters of the public projects page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFilter {
    pub technology: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl ProjectFilter {
    pub fn matches(&self, project: &ProjectRecord) -> bool {
        let technology_ok = self
            .technology
            .as_deref()
            .map_or(true, |t| project.has_technology(t));
        let status_ok = self.status.map_or(true, |s| project.status == s);
        technology_ok && status_ok
    }

    pub fn apply(&self, projects: Vec<ProjectRecord>) -> Vec<ProjectRecord> {
        projects.into_iter().filter(|p| self.matches(p)).collect()
    }
}

/// Distinct technology tags across `projects`, sorted case-insensitively.
/// The first spelling seen wins.
pub fn technologies(projects: &[ProjectRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags: Vec<String> = projects
        .iter()
        .flat_map(|p| p.technologies.iter())
        .filter(|t| seen.insert(t.to_lowercase()))
        .cloned()
        .collect();
    tags.sort_by_key(|t| t.to_lowercase());
    tags
}

/// A visible-project list kept current by refresh notifications
pub struct LiveProjects {
    rx: watch::Receiver<Vec<ProjectRecord>>,
    _subscription: Subscription,
}

impl LiveProjects {
    /// Load the list once and reload it on every refresh published on `bridge`.
    ///
    /// Must be called from within a tokio runtime; reloads are spawned on it.
    pub async fn start<S>(catalog: ProjectCatalog<S>, bridge: &RefreshBridge) -> StoreResult<Self>
    where
        S: SyncConfigStore + ProjectStore + ?Sized + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| StoreError::Task(e.to_string()))?;
        let initial = catalog.list_visible_projects().await?;
        let (tx, rx) = watch::channel(initial);
        let tx = Arc::new(tx);

        let subscription = bridge.subscribe(move |_| {
            let catalog = catalog.clone();
            let tx = Arc::clone(&tx);
            runtime.spawn(async move {
                match catalog.list_visible_projects().await {
                    Ok(projects) => {
                        tracing::debug!("Reloaded {} visible projects", projects.len());
                        tx.send_replace(projects);
                    }
                    Err(e) => tracing::warn!("Failed to reload visible projects: {}", e),
                }
            });
            Ok(())
        });

        Ok(Self {
            rx,
            _subscription: subscription,
        })
    }

    /// Snapshot of the current list
    pub fn current(&self) -> Vec<ProjectRecord> {
        self.rx.borrow().clone()
    }

    /// A receiver that observes every reload
    pub fn watch(&self) -> watch::Receiver<Vec<ProjectRecord>> {
        self.rx.clone()
    }
}
