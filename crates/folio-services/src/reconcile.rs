//! Reconciliation of selected GitHub repositories into project records.
//!
//! A sync run lists the account's repositories once, keeps the selected ones
//! and upserts one project record per repository, keyed by the repository's
//! immutable id. Records are never deleted here; deselected projects simply
//! drop out of the visible list.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::directory::{DirectoryRepo, GitHubDirectory};
use crate::error::SyncError;
use crate::records::{ProjectDraft, ProjectRecord, ProjectStatus, ProjectUpdate};
use crate::store::{ProjectStore, StoreError};

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// A repository whose record could not be written
#[derive(Debug)]
pub struct RepoSyncFailure {
    pub repo: String,
    pub error: StoreError,
}

/// Outcome of one sync run
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Records created or updated, in repository-list order
    pub records: Vec<ProjectRecord>,
    pub failures: Vec<RepoSyncFailure>,
    /// Repositories synced without language data
    pub metadata_gaps: Vec<String>,
    /// Selected names with no repository of that name
    pub unmatched: Vec<String>,
    /// Set once the last-sync time has been recorded
    pub completed_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    /// Every selected repository was written with full metadata
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.metadata_gaps.is_empty()
    }

    pub fn synced_count(&self) -> usize {
        self.records.len()
    }
}

struct RepoOutcome {
    repo: String,
    metadata_gap: bool,
    result: Result<ProjectRecord, StoreError>,
}

/// Candidate record for a repository
pub fn project_draft(repo: &DirectoryRepo, technologies: Vec<String>) -> ProjectDraft {
    ProjectDraft {
        name: repo.name.clone(),
        description: repo.description.clone(),
        long_description: repo.description.clone(),
        github_url: repo.html_url.clone(),
        demo_url: repo.demo_url(),
        image_url: None,
        technologies,
        status: ProjectStatus::Completed,
        github_repo_id: Some(repo.id),
        github_updated_at: repo.updated_at,
    }
}

pub struct ReconcileEngine<S: ProjectStore + ?Sized> {
    store: Arc<S>,
    directory: GitHubDirectory,
    max_concurrency: usize,
}

impl<S: ProjectStore + ?Sized> ReconcileEngine<S> {
    pub fn new(store: Arc<S>, directory: GitHubDirectory) -> Self {
        Self {
            store,
            directory,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Bound on repositories processed at once (at least one)
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Reconcile the selected repositories of `handle` into project records.
    ///
    /// # Errors
    /// `DirectoryUnavailable` if the repository list cannot be fetched; no
    /// record is written in that case. Per-repository failures are reported in
    /// the returned `SyncReport` instead.
    pub async fn sync(&self, handle: &str, selected: &[String]) -> Result<SyncReport, SyncError> {
        let repos = self
            .directory
            .list_repos(handle)
            .await
            .map_err(SyncError::DirectoryUnavailable)?;

        let wanted: HashSet<&str> = selected.iter().map(String::as_str).collect();
        let kept: Vec<&DirectoryRepo> =
            repos.iter().filter(|r| wanted.contains(r.name.as_str())).collect();

        let mut report = SyncReport {
            unmatched: unmatched_names(selected, &repos),
            ..SyncReport::default()
        };
        if !report.unmatched.is_empty() {
            tracing::warn!(
                "Selected repositories not found for {}: {:?}",
                handle,
                report.unmatched
            );
        }

        let outcomes: Vec<RepoOutcome> = stream::iter(kept)
            .map(|repo| self.sync_repo(repo))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            if outcome.metadata_gap {
                report.metadata_gaps.push(outcome.repo.clone());
            }
            match outcome.result {
                Ok(record) => report.records.push(record),
                Err(error) => {
                    tracing::error!("Failed to store project for {}: {}", outcome.repo, error);
                    report.failures.push(RepoSyncFailure {
                        repo: outcome.repo,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            "Synced {} of {} selected repositories for {} ({} failed, {} without languages)",
            report.records.len(),
            selected.len(),
            handle,
            report.failures.len(),
            report.metadata_gaps.len()
        );
        Ok(report)
    }

    async fn sync_repo(&self, repo: &DirectoryRepo) -> RepoOutcome {
        let (technologies, metadata_gap) =
            match self.directory.repo_languages(&repo.full_name).await {
                Ok(languages) => (languages, false),
                Err(source) => {
                    let err = SyncError::PartialMetadataUnavailable {
                        repo: repo.name.clone(),
                        source,
                    };
                    tracing::warn!("{}", err);
                    (Vec::new(), true)
                }
            };

        let draft = project_draft(repo, technologies);
        RepoOutcome {
            repo: repo.name.clone(),
            metadata_gap,
            result: self.upsert(&draft, repo.id).await,
        }
    }

    /// Lookup and write are separate store calls. Overlapping syncs of the
    /// same repository can both miss the lookup; the unique repository-id
    /// index then rejects the second insert and it surfaces as a
    /// `RepoSyncFailure`.
    async fn upsert(&self, draft: &ProjectDraft, repo_id: i64) -> Result<ProjectRecord, StoreError> {
        match self.store.find_project_by_repo_id(repo_id).await? {
            Some(existing) => {
                tracing::debug!("Updating project {} for repository {}", existing.id, draft.name);
                self.store
                    .update_project(&existing.id, &ProjectUpdate::replace_with(draft))
                    .await
            }
            None => {
                tracing::debug!("Creating project for repository {}", draft.name);
                self.store.insert_project(draft).await
            }
        }
    }
}

/// Selected names with no matching repository, first occurrence order
fn unmatched_names(selected: &[String], repos: &[DirectoryRepo]) -> Vec<String> {
    let names: HashSet<&str> = repos.iter().map(|r| r.name.as_str()).collect();
    let mut seen = HashSet::new();
    selected
        .iter()
        .filter(|s| !names.contains(s.as_str()) && seen.insert(s.as_str()))
        .cloned()
        .collect()
}
