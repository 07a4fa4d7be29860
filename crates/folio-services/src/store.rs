//! Persistent store contract and error types.
//!
//! Each record collection gets its own trait so that services only depend on
//! the collections they touch. `PortfolioStore` bundles all of them and is
//! what backends are handed around as (`Arc<dyn PortfolioStore>`).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use folio_core::{
    DatabaseError, NetworkError, ReqwestErrorExt, RusqliteErrorExt, StoreBackend, StoreConfig,
};
use thiserror::Error;

use crate::records::{
    Certification, CertificationDraft, CertificationUpdate, ContactForm, ContactMessage,
    PersonalData, PersonalDataDraft, ProjectDraft, ProjectRecord, ProjectStatus, ProjectUpdate,
    SyncConfig,
};
use crate::store_rest::RestStore;
use crate::store_sqlite::SqliteStore;

/// Errors returned by any store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("{collection} record not found: {id}")]
    NotFound { collection: &'static str, id: String },

    /// Local database failure.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// The hosted database answered with a non-success status.
    #[error("Store API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The hosted database could not be reached.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// A row could not be decoded into a record.
    #[error("Invalid record data: {0}")]
    InvalidData(String),

    /// The blocking worker running a query failed.
    #[error("Store task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub fn not_found(collection: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.into_database_error())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Network(e.into_network_error())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The singleton sync configuration row.
///
/// Mutations other than `replace_sync_config` are single-statement partial
/// updates, so a selection edit and a sync-completion timestamp never
/// overwrite each other.
#[async_trait]
pub trait SyncConfigStore: Send + Sync {
    /// Returns `None` when no account was ever configured.
    async fn get_sync_config(&self) -> StoreResult<Option<SyncConfig>>;

    /// Create or fully replace the singleton.
    async fn replace_sync_config(&self, config: &SyncConfig) -> StoreResult<SyncConfig>;

    /// Replace only the selection. Returns `None` when no row exists.
    async fn update_selected_repos(&self, selected: &[String])
        -> StoreResult<Option<SyncConfig>>;

    /// Set only the last-sync instant. Returns `None` when no row exists.
    async fn update_last_sync(&self, at: DateTime<Utc>) -> StoreResult<Option<SyncConfig>>;

    /// Toggle only the enabled flag. Returns `None` when no row exists.
    async fn set_sync_enabled(&self, enabled: bool) -> StoreResult<Option<SyncConfig>>;
}

/// Project records.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// All projects, newest first.
    async fn list_projects(&self) -> StoreResult<Vec<ProjectRecord>>;

    /// Projects whose name is in `names`, newest first.
    async fn list_projects_named(&self, names: &[String]) -> StoreResult<Vec<ProjectRecord>>;

    async fn list_projects_by_status(
        &self,
        status: ProjectStatus,
    ) -> StoreResult<Vec<ProjectRecord>>;

    async fn get_project(&self, id: &str) -> StoreResult<Option<ProjectRecord>>;

    /// Look up the record bound to a GitHub repository id.
    async fn find_project_by_repo_id(&self, repo_id: i64) -> StoreResult<Option<ProjectRecord>>;

    async fn insert_project(&self, draft: &ProjectDraft) -> StoreResult<ProjectRecord>;

    /// Apply a partial update; id and creation time are preserved.
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if the project doesn't exist.
    async fn update_project(&self, id: &str, update: &ProjectUpdate)
        -> StoreResult<ProjectRecord>;

    async fn delete_project(&self, id: &str) -> StoreResult<()>;
}

/// Certification records.
#[async_trait]
pub trait CertificationStore: Send + Sync {
    /// All certifications, most recently obtained first.
    async fn list_certifications(&self) -> StoreResult<Vec<Certification>>;

    async fn get_certification(&self, id: &str) -> StoreResult<Option<Certification>>;

    async fn insert_certification(&self, draft: &CertificationDraft)
        -> StoreResult<Certification>;

    async fn update_certification(
        &self,
        id: &str,
        update: &CertificationUpdate,
    ) -> StoreResult<Certification>;

    async fn delete_certification(&self, id: &str) -> StoreResult<()>;

    async fn list_certifications_by_institution(
        &self,
        institution: &str,
    ) -> StoreResult<Vec<Certification>>;

    /// Certifications obtained on or after `since`.
    async fn list_certifications_since(&self, since: NaiveDate)
        -> StoreResult<Vec<Certification>>;

    /// Certifications obtained within the six months before `today`.
    async fn recent_certifications(&self, today: NaiveDate) -> StoreResult<Vec<Certification>> {
        let since = today
            .checked_sub_months(chrono::Months::new(6))
            .unwrap_or(NaiveDate::MIN);
        self.list_certifications_since(since).await
    }
}

/// Contact form messages.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert_message(&self, form: &ContactForm) -> StoreResult<ContactMessage>;

    /// All messages, newest first.
    async fn list_messages(&self) -> StoreResult<Vec<ContactMessage>>;

    async fn list_unread_messages(&self) -> StoreResult<Vec<ContactMessage>>;

    async fn mark_message_read(&self, id: &str) -> StoreResult<()>;

    async fn mark_all_messages_read(&self) -> StoreResult<()>;

    async fn delete_message(&self, id: &str) -> StoreResult<()>;

    async fn unread_count(&self) -> StoreResult<u64>;

    /// Case-insensitive substring match over name, email, subject and body.
    async fn search_messages(&self, term: &str) -> StoreResult<Vec<ContactMessage>>;

    /// Messages created within `[start, end]`, newest first.
    async fn list_messages_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<ContactMessage>>;
}

/// The singleton owner profile.
#[async_trait]
pub trait PersonalDataStore: Send + Sync {
    async fn get_personal_data(&self) -> StoreResult<Option<PersonalData>>;

    /// Update the existing row, or insert one when none exists.
    async fn upsert_personal_data(&self, draft: &PersonalDataDraft) -> StoreResult<PersonalData>;

    /// Point the profile at a new CV, creating a placeholder profile if needed.
    async fn set_cv_url(&self, cv_url: &str) -> StoreResult<PersonalData> {
        let mut draft = editable_profile(self.get_personal_data().await?);
        draft.cv_url = Some(cv_url.to_string());
        self.upsert_personal_data(&draft).await
    }

    /// Change the WhatsApp contact number, creating a placeholder profile if needed.
    async fn set_whatsapp_number(&self, number: &str) -> StoreResult<PersonalData> {
        let mut draft = editable_profile(self.get_personal_data().await?);
        draft.whatsapp_number = Some(number.to_string());
        self.upsert_personal_data(&draft).await
    }
}

/// Draft carrying every field of the stored profile, or placeholder names
fn editable_profile(existing: Option<PersonalData>) -> PersonalDataDraft {
    match existing {
        Some(existing) => PersonalDataDraft::from(existing),
        None => PersonalDataDraft {
            full_name: "Your Name".to_string(),
            profession: "Your Profession".to_string(),
            ..Default::default()
        },
    }
}

/// Every collection the portfolio needs.
pub trait PortfolioStore:
    SyncConfigStore + ProjectStore + CertificationStore + ContactStore + PersonalDataStore
{
}

impl<T> PortfolioStore for T where
    T: SyncConfigStore + ProjectStore + CertificationStore + ContactStore + PersonalDataStore
{
}

/// Open the backend selected in configuration.
///
/// # Errors
/// Returns a `StoreError` if the SQLite file cannot be opened or the REST
/// backend is missing its URL or key.
pub fn open_store(config: &StoreConfig, data_dir: &Path) -> StoreResult<Arc<dyn PortfolioStore>> {
    match config.backend {
        StoreBackend::Sqlite => {
            let path = config.effective_sqlite_path(data_dir);
            tracing::info!("Opening SQLite store at {}", path.display());
            Ok(Arc::new(SqliteStore::open(&path)?))
        }
        StoreBackend::Rest => {
            let url = config.rest_url.as_deref().ok_or_else(|| {
                StoreError::Database(DatabaseError::ConnectionFailed(
                    "store.rest_url is not set".to_string(),
                ))
            })?;
            let key = config.rest_api_key.as_deref().ok_or_else(|| {
                StoreError::Database(DatabaseError::ConnectionFailed(
                    "store.rest_api_key is not set".to_string(),
                ))
            })?;
            tracing::info!("Using hosted REST store at {}", url);
            Ok(Arc::new(RestStore::new(url, key)?))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[tokio::test]
    async fn test_open_sqlite_store_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            sqlite_path: None,
            rest_url: None,
            rest_api_key: None,
        };

        let store = open_store(&config, dir.path()).unwrap();
        assert!(store.get_sync_config().await.unwrap().is_none());
        assert!(dir.path().join("folio.db").exists());
    }

    #[test]
    fn test_open_rest_store_requires_key() {
        let config = StoreConfig {
            backend: StoreBackend::Rest,
            sqlite_path: None,
            rest_url: Some("https://db.example.com".to_string()),
            rest_api_key: None,
        };
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            open_store(&config, dir.path()),
            Err(StoreError::Database(DatabaseError::ConnectionFailed(_)))
        ));
    }

    #[tokio::test]
    async fn test_recent_certifications_window() {
        let store = SqliteStore::in_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        for (name, date) in [("old", (2025, 12, 1)), ("new", (2026, 6, 1))] {
            store
                .insert_certification(&CertificationDraft {
                    name: name.to_string(),
                    institution: "Uni".to_string(),
                    date_obtained: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
                    verification_url: None,
                    image_url: None,
                })
                .await
                .unwrap();
        }

        let recent = store.recent_certifications(today).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].name, "new");
    }

    #[tokio::test]
    async fn test_set_cv_url_creates_placeholder_profile() {
        let store = SqliteStore::in_memory().unwrap();
        let profile = store.set_cv_url("https://cdn.example/cv.pdf").await.unwrap();
        assert_eq!(profile.full_name, "Your Name");
        assert_eq!(profile.cv_url.as_deref(), Some("https://cdn.example/cv.pdf"));

        let updated = store.set_cv_url("https://cdn.example/cv-2.pdf").await.unwrap();
        assert_eq!(updated.id, profile.id);
        assert_eq!(updated.cv_url.as_deref(), Some("https://cdn.example/cv-2.pdf"));
    }

    #[tokio::test]
    async fn test_set_whatsapp_number_keeps_other_fields() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_personal_data(&PersonalDataDraft {
                full_name: "Ada Lovelace".to_string(),
                profession: "Engineer".to_string(),
                about_description: Some("Builds engines".to_string()),
                email: Some("ada@example.com".to_string()),
                cv_url: Some("https://cdn.example/cv.pdf".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let profile = store.set_whatsapp_number("+1 (555) 010-2030").await.unwrap();
        assert_eq!(profile.full_name, "Ada Lovelace");
        assert_eq!(profile.about_description.as_deref(), Some("Builds engines"));
        assert_eq!(profile.email.as_deref(), Some("ada@example.com"));
        assert_eq!(profile.cv_url.as_deref(), Some("https://cdn.example/cv.pdf"));
        assert_eq!(profile.whatsapp_number.as_deref(), Some("+1 (555) 010-2030"));
        assert_eq!(
            profile.whatsapp_url(None).as_deref(),
            Some("https://wa.me/15550102030")
        );
    }

    #[tokio::test]
    async fn test_set_whatsapp_number_creates_placeholder_profile() {
        let store = SqliteStore::in_memory().unwrap();
        let profile = store.set_whatsapp_number("5491122334455").await.unwrap();
        assert_eq!(profile.full_name, "Your Name");
        assert_eq!(profile.profession, "Your Profession");
        assert_eq!(profile.whatsapp_number.as_deref(), Some("5491122334455"));
    }
}
