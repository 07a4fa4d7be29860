//! Maps service errors to folio_core::AppError for consistent user-facing messages.
//! Each service has its own module to keep mappings small and readable.

mod contact;
mod directory;
mod store;
mod sync;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use crate::directory::DirectoryError;
    use crate::email::EmailError;
    use crate::error::{ContactError, SyncError};
    use crate::store::StoreError;
    use folio_core::{AppError, DatabaseError, DeliveryError, GitHubError, NetworkError};

    #[test]
    fn test_account_not_found_keeps_handle() {
        let err: AppError = SyncError::AccountNotFound {
            handle: "ghost-user-404".into(),
        }
        .into();
        assert!(matches!(
            err,
            AppError::GitHub(GitHubError::AccountNotFound { ref handle }) if handle == "ghost-user-404"
        ));
    }

    #[test]
    fn test_directory_status_classified() {
        let err: AppError = SyncError::DirectoryUnavailable(DirectoryError::Status {
            status: 401,
            message: "Bad credentials".into(),
        })
        .into();
        assert!(matches!(err, AppError::GitHub(GitHubError::Unauthorized)));
    }

    #[test]
    fn test_store_api_error_is_network() {
        let err: AppError = StoreError::Api {
            status: 503,
            message: "down".into(),
        }
        .into();
        assert!(matches!(
            err,
            AppError::Network(NetworkError::ServerError { status: 503, .. })
        ));
    }

    #[test]
    fn test_store_database_error_passes_through() {
        let err: AppError =
            SyncError::Store(StoreError::Database(DatabaseError::Constraint("dup".into()))).into();
        assert!(matches!(err, AppError::Database(DatabaseError::Constraint(_))));
    }

    #[test]
    fn test_delivery_failure_keeps_message_id() {
        let err: AppError = ContactError::Delivery {
            message_id: "m-1".into(),
            source: EmailError::Rejected {
                status: 422,
                message: "bad".into(),
            },
        }
        .into();
        assert!(matches!(
            err,
            AppError::Delivery(DeliveryError::SavedNotDelivered { ref message_id, .. }) if message_id == "m-1"
        ));
        assert!(!err.user_message().is_empty());
    }

    #[test]
    fn test_sync_failures_have_user_messages() {
        let outage: AppError = SyncError::DirectoryUnavailable(DirectoryError::Status {
            status: 502,
            message: "Bad gateway".into(),
        })
        .into();
        assert_eq!(
            outage.user_message(),
            "GitHub is experiencing issues. Please try again later."
        );

        let disabled: AppError = SyncError::SyncDisabled.into();
        assert_eq!(
            disabled.user_message(),
            "GitHub sync is turned off. Enable it to sync projects."
        );
    }
}
