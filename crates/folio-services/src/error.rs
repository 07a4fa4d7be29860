//! Service-level errors for sync and contact flows.

use folio_core::ValidationResult;
use thiserror::Error;

use crate::directory::DirectoryError;
use crate::email::EmailError;
use crate::store::StoreError;

/// Failures of configuration, reconciliation and coordinated sync runs
#[derive(Debug, Error)]
pub enum SyncError {
    /// The directory reported the account does not exist
    #[error("GitHub account not found: {handle}")]
    AccountNotFound { handle: String },

    #[error("GitHub sync is not configured")]
    NotConfigured,

    #[error("GitHub sync is disabled")]
    SyncDisabled,

    /// The directory could not be reached or answered with an error
    #[error("GitHub directory unavailable: {0}")]
    DirectoryUnavailable(#[source] DirectoryError),

    /// Per-repository metadata could not be fetched. Logged, never returned
    /// from a sync run.
    #[error("Language metadata unavailable for {repo}: {source}")]
    PartialMetadataUnavailable {
        repo: String,
        #[source]
        source: DirectoryError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures of a contact form submission
#[derive(Debug, Error)]
pub enum ContactError {
    /// Rejected before anything was stored
    #[error("Invalid contact form: {}", .0.error_summary())]
    Invalid(ValidationResult),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Stored, but the notification e-mail failed
    #[error("Message {message_id} saved but not delivered: {source}")]
    Delivery {
        message_id: String,
        #[source]
        source: EmailError,
    },
}
