//! End-to-end sync behavior against a mock GitHub API and an in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use folio_core::DatabaseError;
use folio_services::{
    GitHubDirectory, ProjectDraft, ProjectRecord, ProjectStatus, ProjectStore, ProjectUpdate,
    ReconcileEngine, RefreshBridge, RetryConfig, SqliteStore, StoreError, StoreResult,
    SyncConfigManager, SyncConfigStore, SyncCoordinator, SyncError,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_repo(id: i64, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "full_name": format!("alice/{}", name),
        "description": format!("{} description", name),
        "html_url": format!("https://github.com/alice/{}", name),
        "homepage": if id == 1 { "https://repo-a.example" } else { "" },
        "language": "Rust",
        "stargazers_count": id * 10,
        "private": false,
        "updated_at": "2026-01-30T12:00:00Z"
    })
}

fn test_profile(login: &str) -> serde_json::Value {
    serde_json::json!({
        "login": login,
        "id": 99,
        "name": "Alice Example",
        "avatar_url": "https://avatars.example/alice.png",
        "html_url": format!("https://github.com/{}", login),
        "public_repos": 3,
        "bio": null
    })
}

async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(test_profile("alice")))
        .mount(server)
        .await;
}

async fn mount_repos(server: &MockServer, repos: Vec<serde_json::Value>) {
    Mock::given(method("GET"))
        .and(path("/users/alice/repos"))
        .and(query_param("sort", "updated"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repos))
        .mount(server)
        .await;
}

async fn mount_languages(server: &MockServer, repo: &str, status: u16) {
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"Rust": 5000, "Shell": 120}))
    } else {
        ResponseTemplate::new(status)
    };
    Mock::given(method("GET"))
        .and(path(format!("/repos/alice/{}/languages", repo)))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Account "alice" owning repo-a (1), repo-b (2) and repo-c (3)
async fn alice_server() -> MockServer {
    let server = MockServer::start().await;
    mount_profile(&server).await;
    mount_repos(
        &server,
        vec![test_repo(1, "repo-a"), test_repo(2, "repo-b"), test_repo(3, "repo-c")],
    )
    .await;
    for repo in ["repo-a", "repo-b", "repo-c"] {
        mount_languages(&server, repo, 200).await;
    }
    server
}

fn directory(server: &MockServer) -> GitHubDirectory {
    GitHubDirectory::new_with_base_url(&server.uri(), None)
        .unwrap()
        .with_retry(RetryConfig::new(1, 1, 1))
}

fn names(selected: &[&str]) -> Vec<String> {
    selected.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_alice_sync_is_idempotent() {
    let server = alice_server().await;
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let manager = SyncConfigManager::new(Arc::clone(&store), directory(&server));
    let engine = ReconcileEngine::new(Arc::clone(&store), directory(&server));

    let config = manager
        .configure("alice", names(&["repo-a", "repo-b"]))
        .await
        .unwrap();
    assert!(config.sync_enabled);
    assert!(config.last_sync.is_none());

    let first = engine.sync("alice", &config.selected_repos).await.unwrap();
    assert_eq!(first.records.len(), 2);
    assert!(first.is_complete());
    assert_eq!(first.records[0].name, "repo-a");
    assert_eq!(first.records[1].name, "repo-b");
    for record in &first.records {
        assert_eq!(record.status, ProjectStatus::Completed);
        assert_eq!(record.technologies, vec!["Rust", "Shell"]);
    }
    assert_eq!(first.records[0].demo_url.as_deref(), Some("https://repo-a.example"));
    assert!(first.records[1].demo_url.is_none());

    let second = engine.sync("alice", &config.selected_repos).await.unwrap();
    let first_ids: Vec<_> = first.records.iter().map(|r| r.id.clone()).collect();
    let second_ids: Vec<_> = second.records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(first_ids, second_ids);
    assert_eq!(second.records[0].created_at, first.records[0].created_at);
    assert_eq!(store.list_projects().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_configure_unknown_account_persists_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost-user-404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "Not Found"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let manager = SyncConfigManager::new(Arc::clone(&store), directory(&server));

    let err = manager.configure("ghost-user-404", vec![]).await.unwrap_err();
    assert!(
        matches!(err, SyncError::AccountNotFound { ref handle } if handle == "ghost-user-404"),
        "unexpected error: {err}"
    );
    assert!(store.get_sync_config().await.unwrap().is_none());
}

#[tokio::test]
async fn test_configure_directory_outage_persists_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let manager = SyncConfigManager::new(Arc::clone(&store), directory(&server));

    let err = manager.configure("alice", names(&["repo-a"])).await.unwrap_err();
    assert!(matches!(err, SyncError::DirectoryUnavailable(_)));
    assert!(store.get_sync_config().await.unwrap().is_none());
}

#[tokio::test]
async fn test_configure_loads_account_snapshot() {
    let server = alice_server().await;
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let manager = SyncConfigManager::new(Arc::clone(&store), directory(&server));

    manager.configure("alice", vec![]).await.unwrap();

    let snapshot = manager.account_snapshot().unwrap();
    assert_eq!(snapshot.profile.login, "alice");
    assert_eq!(snapshot.repos.len(), 3);

    let options = manager.available_repos().await.unwrap();
    assert_eq!(options[2].name, "repo-c");
    assert_eq!(options[2].stars, 30);
}

#[tokio::test]
async fn test_selection_and_last_sync_updates_do_not_clobber() {
    let server = alice_server().await;
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let manager = SyncConfigManager::new(Arc::clone(&store), directory(&server));

    assert!(matches!(
        manager.update_selection(names(&["repo-a"])).await,
        Err(SyncError::NotConfigured)
    ));

    manager.configure("alice", names(&["repo-a"])).await.unwrap();

    let (selection, completed) = tokio::join!(
        manager.update_selection(names(&["repo-b", "repo-c"])),
        manager.record_sync_completed()
    );
    selection.unwrap();
    completed.unwrap();

    let config = manager.get_config().await.unwrap().unwrap();
    assert_eq!(config.selected_repos, names(&["repo-b", "repo-c"]));
    assert!(config.last_sync.is_some());
}

#[tokio::test]
async fn test_language_failure_for_one_repo_is_absorbed() {
    let server = MockServer::start().await;
    mount_repos(
        &server,
        vec![test_repo(1, "repo-a"), test_repo(2, "repo-b"), test_repo(3, "repo-c")],
    )
    .await;
    mount_languages(&server, "repo-a", 200).await;
    mount_languages(&server, "repo-b", 500).await;
    mount_languages(&server, "repo-c", 200).await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let engine = ReconcileEngine::new(Arc::clone(&store), directory(&server));

    let report = engine
        .sync("alice", &names(&["repo-a", "repo-b", "repo-c"]))
        .await
        .unwrap();

    assert_eq!(report.records.len(), 3);
    assert!(report.failures.is_empty());
    assert_eq!(report.metadata_gaps, names(&["repo-b"]));
    assert!(!report.is_complete());
    assert!(report.records[1].technologies.is_empty());
    assert_eq!(report.records[0].technologies, vec!["Rust", "Shell"]);
}

#[tokio::test]
async fn test_unmatched_selection_is_omitted() {
    let server = alice_server().await;
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let engine = ReconcileEngine::new(Arc::clone(&store), directory(&server));

    let report = engine
        .sync("alice", &names(&["repo-c", "deleted-repo"]))
        .await
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].name, "repo-c");
    assert_eq!(report.unmatched, names(&["deleted-repo"]));
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_repo_list_failure_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/alice/repos"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let engine = ReconcileEngine::new(Arc::clone(&store), directory(&server));

    let err = engine.sync("alice", &names(&["repo-a"])).await.unwrap_err();
    assert!(matches!(err, SyncError::DirectoryUnavailable(ref e) if e.status() == Some(503)));
    assert!(store.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rename_updates_existing_record() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());

    let before = alice_server().await;
    let engine = ReconcileEngine::new(Arc::clone(&store), directory(&before));
    let original = engine.sync("alice", &names(&["repo-a"])).await.unwrap();

    let after = MockServer::start().await;
    mount_repos(&after, vec![test_repo(1, "repo-a-renamed")]).await;
    mount_languages(&after, "repo-a-renamed", 200).await;
    let engine = ReconcileEngine::new(Arc::clone(&store), directory(&after));
    let renamed = engine
        .sync("alice", &names(&["repo-a-renamed"]))
        .await
        .unwrap();

    assert_eq!(renamed.records[0].id, original.records[0].id);
    assert_eq!(renamed.records[0].name, "repo-a-renamed");
    assert_eq!(store.list_projects().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sync_keeps_manually_set_image() {
    let server = alice_server().await;
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let engine = ReconcileEngine::new(Arc::clone(&store), directory(&server));

    let first = engine.sync("alice", &names(&["repo-a"])).await.unwrap();
    let id = first.records[0].id.clone();
    store
        .update_project(
            &id,
            &ProjectUpdate {
                image_url: Some(Some("https://img.example/a.png".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let second = engine.sync("alice", &names(&["repo-a"])).await.unwrap();
    assert_eq!(
        second.records[0].image_url.as_deref(),
        Some("https://img.example/a.png")
    );
}

/// Delegates to SQLite, optionally refusing one repository's insert or
/// answering every repository-id lookup as if nothing were stored yet
struct ScriptedStore {
    inner: SqliteStore,
    reject: Option<&'static str>,
    stale_lookup: bool,
}

#[async_trait]
impl ProjectStore for ScriptedStore {
    async fn list_projects(&self) -> StoreResult<Vec<ProjectRecord>> {
        self.inner.list_projects().await
    }
    async fn list_projects_named(&self, names: &[String]) -> StoreResult<Vec<ProjectRecord>> {
        self.inner.list_projects_named(names).await
    }
    async fn list_projects_by_status(
        &self,
        status: ProjectStatus,
    ) -> StoreResult<Vec<ProjectRecord>> {
        self.inner.list_projects_by_status(status).await
    }
    async fn get_project(&self, id: &str) -> StoreResult<Option<ProjectRecord>> {
        self.inner.get_project(id).await
    }
    async fn find_project_by_repo_id(&self, repo_id: i64) -> StoreResult<Option<ProjectRecord>> {
        if self.stale_lookup {
            return Ok(None);
        }
        self.inner.find_project_by_repo_id(repo_id).await
    }
    async fn insert_project(&self, draft: &ProjectDraft) -> StoreResult<ProjectRecord> {
        if self.reject == Some(draft.name.as_str()) {
            return Err(DatabaseError::Constraint(format!("{} rejected", draft.name)).into());
        }
        self.inner.insert_project(draft).await
    }
    async fn update_project(&self, id: &str, update: &ProjectUpdate) -> StoreResult<ProjectRecord> {
        self.inner.update_project(id, update).await
    }
    async fn delete_project(&self, id: &str) -> StoreResult<()> {
        self.inner.delete_project(id).await
    }
}

#[tokio::test]
async fn test_store_failure_is_attributed_to_repo() {
    let server = alice_server().await;
    let store = Arc::new(ScriptedStore {
        inner: SqliteStore::in_memory().unwrap(),
        reject: Some("repo-b"),
        stale_lookup: false,
    });
    let engine =
        ReconcileEngine::new(Arc::clone(&store), directory(&server)).with_max_concurrency(1);

    let report = engine
        .sync("alice", &names(&["repo-a", "repo-b", "repo-c"]))
        .await
        .unwrap();

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].repo, "repo-b");
    assert!(matches!(
        report.failures[0].error,
        StoreError::Database(DatabaseError::Constraint(_))
    ));
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_stale_lookup_duplicate_is_rejected_not_duplicated() {
    let server = alice_server().await;
    let sqlite = SqliteStore::in_memory().unwrap();

    let engine = ReconcileEngine::new(Arc::new(sqlite.clone()), directory(&server));
    let first = engine.sync("alice", &names(&["repo-a"])).await.unwrap();
    assert!(first.is_complete());

    // A run that read the store before the first run's insert landed.
    let overlapping = ReconcileEngine::new(
        Arc::new(ScriptedStore {
            inner: sqlite.clone(),
            reject: None,
            stale_lookup: true,
        }),
        directory(&server),
    );
    let second = overlapping.sync("alice", &names(&["repo-a"])).await.unwrap();

    assert!(second.records.is_empty());
    assert_eq!(second.failures.len(), 1);
    assert_eq!(second.failures[0].repo, "repo-a");
    assert!(matches!(
        second.failures[0].error,
        StoreError::Database(DatabaseError::Constraint(_))
    ));

    let stored = sqlite.list_projects().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, first.records[0].id);
}

#[tokio::test]
async fn test_coordinator_requires_enabled_config() {
    let server = alice_server().await;
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let coordinator =
        SyncCoordinator::new(Arc::clone(&store), directory(&server), RefreshBridge::new());

    assert!(matches!(coordinator.sync_now().await, Err(SyncError::NotConfigured)));

    coordinator
        .config_manager()
        .configure("alice", names(&["repo-a"]))
        .await
        .unwrap();
    coordinator.config_manager().set_sync_enabled(false).await.unwrap();

    assert!(matches!(coordinator.sync_now().await, Err(SyncError::SyncDisabled)));
    assert!(store.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_coordinator_records_completion_and_publishes() {
    let server = alice_server().await;
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let bridge = RefreshBridge::new();
    let coordinator = SyncCoordinator::new(Arc::clone(&store), directory(&server), bridge.clone());

    let published = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&published);
    let _subscription = bridge.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    coordinator
        .config_manager()
        .configure("alice", names(&["repo-a", "repo-b"]))
        .await
        .unwrap();
    let report = coordinator.sync_now().await.unwrap();

    assert_eq!(report.records.len(), 2);
    assert!(report.completed_at.is_some());
    assert_eq!(published.load(Ordering::SeqCst), 1);

    let config = store.get_sync_config().await.unwrap().unwrap();
    assert_eq!(config.last_sync, report.completed_at);
}

#[tokio::test]
async fn test_coordinator_directory_failure_skips_completion_and_publish() {
    let server = MockServer::start().await;
    mount_profile(&server).await;
    Mock::given(method("GET"))
        .and(path("/users/alice/repos"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let bridge = RefreshBridge::new();
    let coordinator = SyncCoordinator::new(Arc::clone(&store), directory(&server), bridge.clone());

    let published = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&published);
    let _subscription = bridge.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    // The snapshot load fails too, which configure only logs.
    coordinator
        .config_manager()
        .configure("alice", names(&["repo-a"]))
        .await
        .unwrap();

    let err = coordinator.sync_now().await.unwrap_err();
    assert!(matches!(err, SyncError::DirectoryUnavailable(_)));
    assert_eq!(published.load(Ordering::SeqCst), 0);
    assert!(store.get_sync_config().await.unwrap().unwrap().last_sync.is_none());
}

#[tokio::test]
async fn test_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .and(header("authorization", "Bearer ghp_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(test_profile("alice")))
        .expect(1)
        .mount(&server)
        .await;

    let directory =
        GitHubDirectory::new_with_base_url(&server.uri(), Some("ghp_test".to_string())).unwrap();
    assert!(directory.account_exists("alice").await.unwrap());
}

#[tokio::test]
async fn test_languages_ordered_by_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/mixed/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Rust": 100, "TypeScript": 9000, "CSS": 100
        })))
        .mount(&server)
        .await;

    let languages = directory(&server).repo_languages("alice/mixed").await.unwrap();
    assert_eq!(languages, vec!["TypeScript", "CSS", "Rust"]);
}

#[tokio::test]
async fn test_featured_repos_sorted_by_stars() {
    let server = alice_server().await;
    Mock::given(method("GET"))
        .and(path("/users/alice/repos"))
        .and(query_param("sort", "stars"))
        .and(query_param("per_page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(vec![test_repo(3, "repo-c"), test_repo(2, "repo-b")]),
        )
        .mount(&server)
        .await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let manager = SyncConfigManager::new(Arc::clone(&store), directory(&server));
    assert!(matches!(manager.featured_repos(2).await, Err(SyncError::NotConfigured)));

    manager.configure("alice", vec![]).await.unwrap();
    let featured = manager.featured_repos(2).await.unwrap();
    assert_eq!(featured.len(), 2);
    assert_eq!(featured[0].name, "repo-c");
}
