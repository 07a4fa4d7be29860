pub mod contact;
pub mod coordinator;
pub mod directory;
pub mod email;
mod error_mapping;
pub mod error;
pub mod project_view;
pub mod reconcile;
pub mod records;
pub mod refresh;
pub mod retry;
pub mod store;
pub mod store_rest;
pub mod store_sqlite;
pub mod sync_config;

pub use contact::ContactService;
pub use coordinator::SyncCoordinator;
pub use directory::{AccountProfile, DirectoryError, DirectoryRepo, GitHubDirectory};
pub use email::{EmailClient, EmailError, EmailMessage};
pub use error::{ContactError, SyncError};
pub use project_view::{technologies, LiveProjects, ProjectCatalog, ProjectFilter};
pub use reconcile::{project_draft, ReconcileEngine, RepoSyncFailure, SyncReport};
pub use records::*;
pub use refresh::{RefreshBridge, RefreshEvent, Subscription};
pub use retry::RetryConfig;
pub use store::{
    open_store, CertificationStore, ContactStore, PersonalDataStore, PortfolioStore,
    ProjectStore, StoreError, StoreResult, SyncConfigStore,
};
pub use store_rest::RestStore;
pub use store_sqlite::SqliteStore;
pub use sync_config::{AccountSnapshot, RepoOption, SyncConfigManager};
