use crate::error::SyncError;
use folio_core::{AppError, GitHubError};

impl From<SyncError> for AppError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::AccountNotFound { handle } => {
                AppError::GitHub(GitHubError::AccountNotFound { handle })
            }
            SyncError::NotConfigured => AppError::GitHub(GitHubError::NotConfigured),
            SyncError::SyncDisabled => AppError::GitHub(GitHubError::SyncDisabled),
            SyncError::DirectoryUnavailable(e) => e.into(),
            SyncError::PartialMetadataUnavailable { source, .. } => source.into(),
            SyncError::Store(e) => e.into(),
        }
    }
}
