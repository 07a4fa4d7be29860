// crates/folio-services/src/store_sqlite.rs

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use folio_core::DatabaseError;
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::records::{
    Certification, CertificationDraft, CertificationUpdate, ContactForm, ContactMessage,
    PersonalData, PersonalDataDraft, ProjectDraft, ProjectRecord, ProjectStatus, ProjectUpdate,
    SyncConfig,
};
use crate::store::{
    CertificationStore, ContactStore, PersonalDataStore, ProjectStore, StoreError, StoreResult,
    SyncConfigStore,
};

const SCHEMA_VERSION: i32 = 1;

const PROJECT_COLUMNS: &str = "id, name, description, long_description, github_url, demo_url, \
     image_url, technologies, status, github_repo_id, github_updated_at, created_at, updated_at";

const CERTIFICATION_COLUMNS: &str =
    "id, name, institution, date_obtained, verification_url, image_url, created_at, updated_at";

const MESSAGE_COLUMNS: &str = "id, name, email, subject, message, read_status, created_at";

const PERSONAL_COLUMNS: &str = "id, full_name, profession, hero_description, \
     about_description, email, phone, whatsapp_number, linkedin_url, github_username, cv_url, \
     profile_image_url, created_at, updated_at";

/// Local SQLite storage for all portfolio collections
///
/// The connection is guarded by a mutex and every query runs on the blocking
/// pool, so the store can be shared freely across tasks.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the database
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::ConnectionFailed(format!("{}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Private database that lives as long as the store
    pub fn in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Create tables and record the schema version
fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)", [])?;

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()?
        .unwrap_or(0);

    if version > SCHEMA_VERSION {
        return Err(DatabaseError::MigrationFailed(format!(
            "database schema v{version} is newer than supported v{SCHEMA_VERSION}"
        ))
        .into());
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS github_config (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            username TEXT NOT NULL,
            selected_repos TEXT NOT NULL DEFAULT '[]',
            sync_enabled INTEGER NOT NULL DEFAULT 1,
            last_sync TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            long_description TEXT,
            github_url TEXT NOT NULL,
            demo_url TEXT,
            image_url TEXT,
            technologies TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL,
            github_repo_id INTEGER,
            github_updated_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS certifications (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            institution TEXT NOT NULL,
            date_obtained TEXT NOT NULL,
            verification_url TEXT,
            image_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS contact_messages (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            subject TEXT NOT NULL,
            message TEXT NOT NULL,
            read_status INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS personal_data (
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            profession TEXT NOT NULL,
            hero_description TEXT,
            about_description TEXT,
            email TEXT,
            phone TEXT,
            whatsapp_number TEXT,
            linkedin_url TEXT,
            github_username TEXT,
            cv_url TEXT,
            profile_image_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_projects_repo_id
            ON projects(github_repo_id) WHERE github_repo_id IS NOT NULL;
        CREATE INDEX IF NOT EXISTS idx_projects_name ON projects(name);
        CREATE INDEX IF NOT EXISTS idx_projects_created ON projects(created_at);
        CREATE INDEX IF NOT EXISTS idx_certifications_date ON certifications(date_obtained);
        CREATE INDEX IF NOT EXISTS idx_messages_created ON contact_messages(created_at);",
    )?;

    if version < SCHEMA_VERSION {
        conn.execute("DELETE FROM schema_version", [])?;
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", params![SCHEMA_VERSION])?;
    }

    Ok(())
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn get_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn get_opt_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn get_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn get_status(row: &Row<'_>, idx: usize) -> rusqlite::Result<ProjectStatus> {
    let raw: String = row.get(idx)?;
    ProjectStatus::parse(&raw).ok_or_else(|| {
        conversion_error(idx, StoreError::invalid_data(format!("unknown status '{raw}'")))
    })
}

fn get_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| conversion_error(idx, e))
}

fn sync_config_from_row(row: &Row<'_>) -> rusqlite::Result<SyncConfig> {
    Ok(SyncConfig {
        account_handle: row.get(0)?,
        selected_repos: get_list(row, 1)?,
        sync_enabled: row.get(2)?,
        last_sync: get_opt_timestamp(row, 3)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectRecord> {
    Ok(ProjectRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        long_description: row.get(3)?,
        github_url: row.get(4)?,
        demo_url: row.get(5)?,
        image_url: row.get(6)?,
        technologies: get_list(row, 7)?,
        status: get_status(row, 8)?,
        github_repo_id: row.get(9)?,
        github_updated_at: get_opt_timestamp(row, 10)?,
        created_at: get_timestamp(row, 11)?,
        updated_at: get_timestamp(row, 12)?,
    })
}

fn certification_from_row(row: &Row<'_>) -> rusqlite::Result<Certification> {
    Ok(Certification {
        id: row.get(0)?,
        name: row.get(1)?,
        institution: row.get(2)?,
        date_obtained: get_date(row, 3)?,
        verification_url: row.get(4)?,
        image_url: row.get(5)?,
        created_at: get_timestamp(row, 6)?,
        updated_at: get_timestamp(row, 7)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<ContactMessage> {
    Ok(ContactMessage {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        subject: row.get(3)?,
        message: row.get(4)?,
        read_status: row.get(5)?,
        created_at: get_timestamp(row, 6)?,
    })
}

fn personal_from_row(row: &Row<'_>) -> rusqlite::Result<PersonalData> {
    Ok(PersonalData {
        id: row.get(0)?,
        full_name: row.get(1)?,
        profession: row.get(2)?,
        hero_description: row.get(3)?,
        about_description: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        whatsapp_number: row.get(7)?,
        linkedin_url: row.get(8)?,
        github_username: row.get(9)?,
        cv_url: row.get(10)?,
        profile_image_url: row.get(11)?,
        created_at: get_timestamp(row, 12)?,
        updated_at: get_timestamp(row, 13)?,
    })
}

fn read_sync_config(conn: &Connection) -> StoreResult<Option<SyncConfig>> {
    let config = conn
        .query_row(
            "SELECT username, selected_repos, sync_enabled, last_sync
             FROM github_config WHERE id = 1",
            [],
            sync_config_from_row,
        )
        .optional()?;
    Ok(config)
}

fn read_project(conn: &Connection, id: &str) -> StoreResult<Option<ProjectRecord>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], project_from_row).optional()?)
}

fn query_projects(
    conn: &Connection,
    where_clause: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<ProjectRecord>> {
    let sql = format!(
        "SELECT {PROJECT_COLUMNS} FROM projects {where_clause} \
         ORDER BY created_at DESC, rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let projects = stmt
        .query_map(params, project_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(projects)
}

fn read_certification(conn: &Connection, id: &str) -> StoreResult<Option<Certification>> {
    let sql = format!("SELECT {CERTIFICATION_COLUMNS} FROM certifications WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], certification_from_row).optional()?)
}

fn query_certifications(
    conn: &Connection,
    where_clause: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<Certification>> {
    let sql = format!(
        "SELECT {CERTIFICATION_COLUMNS} FROM certifications {where_clause} \
         ORDER BY date_obtained DESC, created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let certifications = stmt
        .query_map(params, certification_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(certifications)
}

fn query_messages(
    conn: &Connection,
    where_clause: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<ContactMessage>> {
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS} FROM contact_messages {where_clause} \
         ORDER BY created_at DESC, rowid DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let messages = stmt
        .query_map(params, message_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}

fn read_personal_data(conn: &Connection) -> StoreResult<Option<PersonalData>> {
    let sql = format!("SELECT {PERSONAL_COLUMNS} FROM personal_data ORDER BY created_at LIMIT 1");
    Ok(conn.query_row(&sql, [], personal_from_row).optional()?)
}

/// Escape LIKE wildcards so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl SyncConfigStore for SqliteStore {
    async fn get_sync_config(&self) -> StoreResult<Option<SyncConfig>> {
        self.with_conn(read_sync_config).await
    }

    async fn replace_sync_config(&self, config: &SyncConfig) -> StoreResult<SyncConfig> {
        let config = config.clone();
        self.with_conn(move |conn| {
            let now = timestamp(&Utc::now());
            conn.execute(
                "INSERT INTO github_config
                    (id, username, selected_repos, sync_enabled, last_sync, created_at, updated_at)
                 VALUES (1, ?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    username = excluded.username,
                    selected_repos = excluded.selected_repos,
                    sync_enabled = excluded.sync_enabled,
                    last_sync = excluded.last_sync,
                    updated_at = excluded.updated_at",
                params![
                    config.account_handle,
                    serde_json::to_string(&config.selected_repos)?,
                    config.sync_enabled,
                    config.last_sync.as_ref().map(timestamp),
                    now,
                ],
            )?;
            read_sync_config(conn)?
                .ok_or_else(|| StoreError::not_found("github_config", "1"))
        })
        .await
    }

    async fn update_selected_repos(
        &self,
        selected: &[String],
    ) -> StoreResult<Option<SyncConfig>> {
        let selected = serde_json::to_string(selected)?;
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE github_config SET selected_repos = ?1, updated_at = ?2 WHERE id = 1",
                params![selected, timestamp(&Utc::now())],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            read_sync_config(conn)
        })
        .await
    }

    async fn update_last_sync(&self, at: DateTime<Utc>) -> StoreResult<Option<SyncConfig>> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE github_config SET last_sync = ?1, updated_at = ?2 WHERE id = 1",
                params![timestamp(&at), timestamp(&Utc::now())],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            read_sync_config(conn)
        })
        .await
    }

    async fn set_sync_enabled(&self, enabled: bool) -> StoreResult<Option<SyncConfig>> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE github_config SET sync_enabled = ?1, updated_at = ?2 WHERE id = 1",
                params![enabled, timestamp(&Utc::now())],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            read_sync_config(conn)
        })
        .await
    }
}

#[async_trait]
impl ProjectStore for SqliteStore {
    async fn list_projects(&self) -> StoreResult<Vec<ProjectRecord>> {
        self.with_conn(|conn| query_projects(conn, "", [])).await
    }

    async fn list_projects_named(&self, names: &[String]) -> StoreResult<Vec<ProjectRecord>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let names = names.to_vec();
        self.with_conn(move |conn| {
            let placeholders = vec!["?"; names.len()].join(", ");
            query_projects(
                conn,
                &format!("WHERE name IN ({placeholders})"),
                params_from_iter(names.iter()),
            )
        })
        .await
    }

    async fn list_projects_by_status(
        &self,
        status: ProjectStatus,
    ) -> StoreResult<Vec<ProjectRecord>> {
        self.with_conn(move |conn| query_projects(conn, "WHERE status = ?1", [status.as_str()]))
            .await
    }

    async fn get_project(&self, id: &str) -> StoreResult<Option<ProjectRecord>> {
        let id = id.to_string();
        self.with_conn(move |conn| read_project(conn, &id)).await
    }

    async fn find_project_by_repo_id(&self, repo_id: i64) -> StoreResult<Option<ProjectRecord>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE github_repo_id = ?1");
            Ok(conn.query_row(&sql, [repo_id], project_from_row).optional()?)
        })
        .await
    }

    async fn insert_project(&self, draft: &ProjectDraft) -> StoreResult<ProjectRecord> {
        let draft = draft.clone();
        self.with_conn(move |conn| {
            let id = new_id();
            let now = timestamp(&Utc::now());
            conn.execute(
                "INSERT INTO projects (id, name, description, long_description, github_url,
                    demo_url, image_url, technologies, status, github_repo_id,
                    github_updated_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
                params![
                    id,
                    draft.name,
                    draft.description,
                    draft.long_description,
                    draft.github_url,
                    draft.demo_url,
                    draft.image_url,
                    serde_json::to_string(&draft.technologies)?,
                    draft.status.as_str(),
                    draft.github_repo_id,
                    draft.github_updated_at.as_ref().map(timestamp),
                    now,
                ],
            )?;
            read_project(conn, &id)?.ok_or_else(|| StoreError::not_found("projects", id))
        })
        .await
    }

    async fn update_project(
        &self,
        id: &str,
        update: &ProjectUpdate,
    ) -> StoreResult<ProjectRecord> {
        let id = id.to_string();
        let update = update.clone();
        self.with_conn(move |conn| {
            let mut project = read_project(conn, &id)?
                .ok_or_else(|| StoreError::not_found("projects", id.clone()))?;
            update.apply_to(&mut project);
            project.updated_at = Utc::now();

            conn.execute(
                "UPDATE projects SET name = ?2, description = ?3, long_description = ?4,
                    github_url = ?5, demo_url = ?6, image_url = ?7, technologies = ?8,
                    status = ?9, github_repo_id = ?10, github_updated_at = ?11, updated_at = ?12
                 WHERE id = ?1",
                params![
                    project.id,
                    project.name,
                    project.description,
                    project.long_description,
                    project.github_url,
                    project.demo_url,
                    project.image_url,
                    serde_json::to_string(&project.technologies)?,
                    project.status.as_str(),
                    project.github_repo_id,
                    project.github_updated_at.as_ref().map(timestamp),
                    timestamp(&project.updated_at),
                ],
            )?;
            read_project(conn, &id)?.ok_or_else(|| StoreError::not_found("projects", id))
        })
        .await
    }

    async fn delete_project(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM projects WHERE id = ?1", [id])?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl CertificationStore for SqliteStore {
    async fn list_certifications(&self) -> StoreResult<Vec<Certification>> {
        self.with_conn(|conn| query_certifications(conn, "", [])).await
    }

    async fn get_certification(&self, id: &str) -> StoreResult<Option<Certification>> {
        let id = id.to_string();
        self.with_conn(move |conn| read_certification(conn, &id)).await
    }

    async fn insert_certification(
        &self,
        draft: &CertificationDraft,
    ) -> StoreResult<Certification> {
        let draft = draft.clone();
        self.with_conn(move |conn| {
            let id = new_id();
            let now = timestamp(&Utc::now());
            conn.execute(
                "INSERT INTO certifications (id, name, institution, date_obtained,
                    verification_url, image_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    id,
                    draft.name,
                    draft.institution,
                    draft.date_obtained.to_string(),
                    draft.verification_url,
                    draft.image_url,
                    now,
                ],
            )?;
            read_certification(conn, &id)?
                .ok_or_else(|| StoreError::not_found("certifications", id))
        })
        .await
    }

    async fn update_certification(
        &self,
        id: &str,
        update: &CertificationUpdate,
    ) -> StoreResult<Certification> {
        let id = id.to_string();
        let update = update.clone();
        self.with_conn(move |conn| {
            let mut certification = read_certification(conn, &id)?
                .ok_or_else(|| StoreError::not_found("certifications", id.clone()))?;
            update.apply_to(&mut certification);

            conn.execute(
                "UPDATE certifications SET name = ?2, institution = ?3, date_obtained = ?4,
                    verification_url = ?5, image_url = ?6, updated_at = ?7
                 WHERE id = ?1",
                params![
                    certification.id,
                    certification.name,
                    certification.institution,
                    certification.date_obtained.to_string(),
                    certification.verification_url,
                    certification.image_url,
                    timestamp(&Utc::now()),
                ],
            )?;
            read_certification(conn, &id)?
                .ok_or_else(|| StoreError::not_found("certifications", id))
        })
        .await
    }

    async fn delete_certification(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM certifications WHERE id = ?1", [id])?;
            Ok(())
        })
        .await
    }

    async fn list_certifications_by_institution(
        &self,
        institution: &str,
    ) -> StoreResult<Vec<Certification>> {
        let institution = institution.to_string();
        self.with_conn(move |conn| {
            query_certifications(conn, "WHERE institution = ?1", [institution])
        })
        .await
    }

    async fn list_certifications_since(
        &self,
        since: NaiveDate,
    ) -> StoreResult<Vec<Certification>> {
        self.with_conn(move |conn| {
            query_certifications(conn, "WHERE date_obtained >= ?1", [since.to_string()])
        })
        .await
    }
}

#[async_trait]
impl ContactStore for SqliteStore {
    async fn insert_message(&self, form: &ContactForm) -> StoreResult<ContactMessage> {
        let form = form.clone();
        self.with_conn(move |conn| {
            let id = new_id();
            conn.execute(
                "INSERT INTO contact_messages (id, name, email, subject, message, read_status,
                    created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
                params![
                    id,
                    form.name,
                    form.email,
                    form.subject,
                    form.message,
                    timestamp(&Utc::now()),
                ],
            )?;
            let sql = format!("SELECT {MESSAGE_COLUMNS} FROM contact_messages WHERE id = ?1");
            Ok(conn.query_row(&sql, [id], message_from_row)?)
        })
        .await
    }

    async fn list_messages(&self) -> StoreResult<Vec<ContactMessage>> {
        self.with_conn(|conn| query_messages(conn, "", [])).await
    }

    async fn list_unread_messages(&self) -> StoreResult<Vec<ContactMessage>> {
        self.with_conn(|conn| query_messages(conn, "WHERE read_status = 0", []))
            .await
    }

    async fn mark_message_read(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let changed =
                conn.execute("UPDATE contact_messages SET read_status = 1 WHERE id = ?1", [&id])?;
            if changed == 0 {
                return Err(StoreError::not_found("contact_messages", id));
            }
            Ok(())
        })
        .await
    }

    async fn mark_all_messages_read(&self) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE contact_messages SET read_status = 1 WHERE read_status = 0", [])?;
            Ok(())
        })
        .await
    }

    async fn delete_message(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM contact_messages WHERE id = ?1", [id])?;
            Ok(())
        })
        .await
    }

    async fn unread_count(&self) -> StoreResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM contact_messages WHERE read_status = 0",
                [],
                |row| row.get(0),
            )?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
        .await
    }

    async fn search_messages(&self, term: &str) -> StoreResult<Vec<ContactMessage>> {
        let pattern = like_pattern(term);
        self.with_conn(move |conn| {
            query_messages(
                conn,
                "WHERE name LIKE ?1 ESCAPE '\\' OR email LIKE ?1 ESCAPE '\\'
                    OR subject LIKE ?1 ESCAPE '\\' OR message LIKE ?1 ESCAPE '\\'",
                [pattern],
            )
        })
        .await
    }

    async fn list_messages_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<ContactMessage>> {
        self.with_conn(move |conn| {
            query_messages(
                conn,
                "WHERE created_at >= ?1 AND created_at <= ?2",
                [timestamp(&start), timestamp(&end)],
            )
        })
        .await
    }
}

#[async_trait]
impl PersonalDataStore for SqliteStore {
    async fn get_personal_data(&self) -> StoreResult<Option<PersonalData>> {
        self.with_conn(read_personal_data).await
    }

    async fn upsert_personal_data(&self, draft: &PersonalDataDraft) -> StoreResult<PersonalData> {
        let draft = draft.clone().normalized();
        self.with_conn(move |conn| {
            let now = timestamp(&Utc::now());
            let id = match read_personal_data(conn)? {
                Some(existing) => {
                    conn.execute(
                        "UPDATE personal_data SET full_name = ?2, profession = ?3,
                            hero_description = ?4, about_description = ?5, email = ?6,
                            phone = ?7, whatsapp_number = ?8, linkedin_url = ?9,
                            github_username = ?10, cv_url = ?11, profile_image_url = ?12,
                            updated_at = ?13
                         WHERE id = ?1",
                        params![
                            existing.id,
                            draft.full_name,
                            draft.profession,
                            draft.hero_description,
                            draft.about_description,
                            draft.email,
                            draft.phone,
                            draft.whatsapp_number,
                            draft.linkedin_url,
                            draft.github_username,
                            draft.cv_url,
                            draft.profile_image_url,
                            now,
                        ],
                    )?;
                    existing.id
                }
                None => {
                    let id = new_id();
                    conn.execute(
                        "INSERT INTO personal_data (id, full_name, profession, hero_description,
                            about_description, email, phone, whatsapp_number, linkedin_url,
                            github_username, cv_url, profile_image_url, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
                        params![
                            id,
                            draft.full_name,
                            draft.profession,
                            draft.hero_description,
                            draft.about_description,
                            draft.email,
                            draft.phone,
                            draft.whatsapp_number,
                            draft.linkedin_url,
                            draft.github_username,
                            draft.cv_url,
                            draft.profile_image_url,
                            now,
                        ],
                    )?;
                    id
                }
            };
            let sql = format!("SELECT {PERSONAL_COLUMNS} FROM personal_data WHERE id = ?1");
            Ok(conn.query_row(&sql, [id], personal_from_row)?)
        })
        .await
    }
}
