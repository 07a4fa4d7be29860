//! Hosted store backend speaking the PostgREST dialect.
//!
//! Every collection maps to a table under `{base}/rest/v1/`. Filters use
//! PostgREST operators (`eq.`, `in.(...)`, `gte.`, `ilike.`, `or=(...)`) and
//! writes ask for the affected rows back with `Prefer: return=representation`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

use crate::records::{
    Certification, CertificationDraft, CertificationUpdate, ContactForm, ContactMessage,
    PersonalData, PersonalDataDraft, ProjectDraft, ProjectRecord, ProjectStatus, ProjectUpdate,
    SyncConfig,
};
use crate::store::{
    CertificationStore, ContactStore, PersonalDataStore, ProjectStore, StoreError, StoreResult,
    SyncConfigStore,
};

const SYNC_CONFIG_TABLE: &str = "github_config";
const PROJECTS_TABLE: &str = "projects";
const CERTIFICATIONS_TABLE: &str = "certifications";
const MESSAGES_TABLE: &str = "contact_messages";
const PERSONAL_DATA_TABLE: &str = "personal_data";

/// Matches the singleton row whatever its id
const EVERY_ROW: (&str, &str) = ("id", "not.is.null");

type Query = Vec<(&'static str, String)>;

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Double-quote a value for use inside `in.(...)` or `or=(...)`
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Serialize a partial update and stamp `updated_at`
fn with_updated_at(update: &impl Serialize) -> StoreResult<Value> {
    let mut body = serde_json::to_value(update)?;
    if let Value::Object(map) = &mut body {
        map.insert("updated_at".to_string(), json!(timestamp(&Utc::now())));
    }
    Ok(body)
}

/// Client for a PostgREST-compatible hosted database
#[derive(Debug, Clone)]
pub struct RestStore {
    base_url: Url,
    client: Arc<Client>,
    api_key: String,
}

impl RestStore {
    /// `base_url` is the project URL; `/rest/v1/` is appended.
    pub fn new(base_url: &str, api_key: &str) -> StoreResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let mut base_url = Url::parse(base_url)
            .map_err(|e| StoreError::invalid_data(format!("invalid store URL: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let base_url = base_url
            .join("rest/v1/")
            .map_err(|e| StoreError::invalid_data(format!("invalid store URL: {e}")))?;

        Ok(Self {
            base_url,
            client: Arc::new(client),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: Method, table: &str) -> StoreResult<RequestBuilder> {
        let url = self
            .base_url
            .join(table)
            .map_err(|e| StoreError::invalid_data(e.to_string()))?;
        Ok(self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::ACCEPT, "application/json"))
    }

    /// Non-2xx responses become `StoreError::Api` with the server's message
    async fn check_response(&self, response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        tracing::warn!("Store API error ({}): {}", status, message);
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: Query) -> StoreResult<Vec<T>> {
        let response = self
            .request(Method::GET, table)?
            .query(&[("select", "*")])
            .query(&query)
            .send()
            .await?;
        let response = self.check_response(response).await?;
        Ok(response.json().await?)
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        mut query: Query,
    ) -> StoreResult<Option<T>> {
        query.push(("limit", "1".to_string()));
        let rows: Vec<T> = self.select(table, query).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<T: DeserializeOwned>(
        &self,
        table: &str,
        body: &impl Serialize,
    ) -> StoreResult<T> {
        let response = self
            .request(Method::POST, table)?
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let response = self.check_response(response).await?;
        let rows: Vec<T> = response.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::invalid_data(format!("insert into {table} returned no row")))
    }

    /// PATCH matching rows; returns the updated rows
    async fn patch<T: DeserializeOwned>(
        &self,
        table: &str,
        query: Query,
        body: &impl Serialize,
    ) -> StoreResult<Vec<T>> {
        let response = self
            .request(Method::PATCH, table)?
            .header("Prefer", "return=representation")
            .query(&query)
            .json(body)
            .send()
            .await?;
        let response = self.check_response(response).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, table: &str, query: Query) -> StoreResult<()> {
        let response = self.request(Method::DELETE, table)?.query(&query).send().await?;
        self.check_response(response).await?;
        Ok(())
    }

    /// Exact row count from the `Content-Range` header
    async fn count(&self, table: &str, query: Query) -> StoreResult<u64> {
        let response = self
            .request(Method::HEAD, table)?
            .header("Prefer", "count=exact")
            .query(&[("select", "id")])
            .query(&query)
            .send()
            .await?;
        let response = self.check_response(response).await?;

        let range = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StoreError::invalid_data("count response has no Content-Range"))?;
        range
            .rsplit_once('/')
            .and_then(|(_, total)| total.parse().ok())
            .ok_or_else(|| StoreError::invalid_data(format!("unparseable Content-Range '{range}'")))
    }

    async fn patch_sync_config(&self, body: Value) -> StoreResult<Option<SyncConfig>> {
        let rows: Vec<SyncConfig> = self
            .patch(SYNC_CONFIG_TABLE, vec![(EVERY_ROW.0, EVERY_ROW.1.to_string())], &body)
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl SyncConfigStore for RestStore {
    async fn get_sync_config(&self) -> StoreResult<Option<SyncConfig>> {
        self.select_one(SYNC_CONFIG_TABLE, vec![("order", "created_at.desc".to_string())])
            .await
    }

    async fn replace_sync_config(&self, config: &SyncConfig) -> StoreResult<SyncConfig> {
        let mut body = serde_json::to_value(config)?;
        if let Value::Object(map) = &mut body {
            map.insert("updated_at".to_string(), json!(timestamp(&Utc::now())));
        }

        if let Some(updated) = self.patch_sync_config(body.clone()).await? {
            return Ok(updated);
        }
        self.insert(SYNC_CONFIG_TABLE, &body).await
    }

    async fn update_selected_repos(
        &self,
        selected: &[String],
    ) -> StoreResult<Option<SyncConfig>> {
        self.patch_sync_config(json!({
            "selected_repos": selected,
            "updated_at": timestamp(&Utc::now()),
        }))
        .await
    }

    async fn update_last_sync(&self, at: DateTime<Utc>) -> StoreResult<Option<SyncConfig>> {
        self.patch_sync_config(json!({
            "last_sync": timestamp(&at),
            "updated_at": timestamp(&Utc::now()),
        }))
        .await
    }

    async fn set_sync_enabled(&self, enabled: bool) -> StoreResult<Option<SyncConfig>> {
        self.patch_sync_config(json!({
            "sync_enabled": enabled,
            "updated_at": timestamp(&Utc::now()),
        }))
        .await
    }
}

#[async_trait]
impl ProjectStore for RestStore {
    async fn list_projects(&self) -> StoreResult<Vec<ProjectRecord>> {
        self.select(PROJECTS_TABLE, vec![("order", "created_at.desc".to_string())])
            .await
    }

    async fn list_projects_named(&self, names: &[String]) -> StoreResult<Vec<ProjectRecord>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let list = names.iter().map(|n| quoted(n)).collect::<Vec<_>>().join(",");
        self.select(
            PROJECTS_TABLE,
            vec![
                ("name", format!("in.({list})")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn list_projects_by_status(
        &self,
        status: ProjectStatus,
    ) -> StoreResult<Vec<ProjectRecord>> {
        self.select(
            PROJECTS_TABLE,
            vec![
                ("status", eq(status.as_str())),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn get_project(&self, id: &str) -> StoreResult<Option<ProjectRecord>> {
        self.select_one(PROJECTS_TABLE, vec![("id", eq(id))]).await
    }

    async fn find_project_by_repo_id(&self, repo_id: i64) -> StoreResult<Option<ProjectRecord>> {
        self.select_one(PROJECTS_TABLE, vec![("github_repo_id", eq(repo_id))])
            .await
    }

    async fn insert_project(&self, draft: &ProjectDraft) -> StoreResult<ProjectRecord> {
        self.insert(PROJECTS_TABLE, draft).await
    }

    async fn update_project(
        &self,
        id: &str,
        update: &ProjectUpdate,
    ) -> StoreResult<ProjectRecord> {
        let rows: Vec<ProjectRecord> = self
            .patch(PROJECTS_TABLE, vec![("id", eq(id))], &with_updated_at(update)?)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(PROJECTS_TABLE, id))
    }

    async fn delete_project(&self, id: &str) -> StoreResult<()> {
        self.delete(PROJECTS_TABLE, vec![("id", eq(id))]).await
    }
}

#[async_trait]
impl CertificationStore for RestStore {
    async fn list_certifications(&self) -> StoreResult<Vec<Certification>> {
        self.select(
            CERTIFICATIONS_TABLE,
            vec![("order", "date_obtained.desc".to_string())],
        )
        .await
    }

    async fn get_certification(&self, id: &str) -> StoreResult<Option<Certification>> {
        self.select_one(CERTIFICATIONS_TABLE, vec![("id", eq(id))]).await
    }

    async fn insert_certification(
        &self,
        draft: &CertificationDraft,
    ) -> StoreResult<Certification> {
        self.insert(CERTIFICATIONS_TABLE, draft).await
    }

    async fn update_certification(
        &self,
        id: &str,
        update: &CertificationUpdate,
    ) -> StoreResult<Certification> {
        let rows: Vec<Certification> = self
            .patch(CERTIFICATIONS_TABLE, vec![("id", eq(id))], &with_updated_at(update)?)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(CERTIFICATIONS_TABLE, id))
    }

    async fn delete_certification(&self, id: &str) -> StoreResult<()> {
        self.delete(CERTIFICATIONS_TABLE, vec![("id", eq(id))]).await
    }

    async fn list_certifications_by_institution(
        &self,
        institution: &str,
    ) -> StoreResult<Vec<Certification>> {
        self.select(
            CERTIFICATIONS_TABLE,
            vec![
                ("institution", eq(institution)),
                ("order", "date_obtained.desc".to_string()),
            ],
        )
        .await
    }

    async fn list_certifications_since(
        &self,
        since: NaiveDate,
    ) -> StoreResult<Vec<Certification>> {
        self.select(
            CERTIFICATIONS_TABLE,
            vec![
                ("date_obtained", format!("gte.{since}")),
                ("order", "date_obtained.desc".to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl ContactStore for RestStore {
    async fn insert_message(&self, form: &ContactForm) -> StoreResult<ContactMessage> {
        let body = json!({
            "name": form.name,
            "email": form.email,
            "subject": form.subject,
            "message": form.message,
            "read_status": false,
        });
        self.insert(MESSAGES_TABLE, &body).await
    }

    async fn list_messages(&self) -> StoreResult<Vec<ContactMessage>> {
        self.select(MESSAGES_TABLE, vec![("order", "created_at.desc".to_string())])
            .await
    }

    async fn list_unread_messages(&self) -> StoreResult<Vec<ContactMessage>> {
        self.select(
            MESSAGES_TABLE,
            vec![
                ("read_status", eq(false)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn mark_message_read(&self, id: &str) -> StoreResult<()> {
        let rows: Vec<ContactMessage> = self
            .patch(MESSAGES_TABLE, vec![("id", eq(id))], &json!({ "read_status": true }))
            .await?;
        if rows.is_empty() {
            return Err(StoreError::not_found(MESSAGES_TABLE, id));
        }
        Ok(())
    }

    async fn mark_all_messages_read(&self) -> StoreResult<()> {
        let _: Vec<ContactMessage> = self
            .patch(
                MESSAGES_TABLE,
                vec![("read_status", eq(false))],
                &json!({ "read_status": true }),
            )
            .await?;
        Ok(())
    }

    async fn delete_message(&self, id: &str) -> StoreResult<()> {
        self.delete(MESSAGES_TABLE, vec![("id", eq(id))]).await
    }

    async fn unread_count(&self) -> StoreResult<u64> {
        self.count(MESSAGES_TABLE, vec![("read_status", eq(false))])
            .await
    }

    async fn search_messages(&self, term: &str) -> StoreResult<Vec<ContactMessage>> {
        let pattern = quoted(&format!("*{term}*"));
        let filter = ["name", "email", "subject", "message"]
            .iter()
            .map(|column| format!("{column}.ilike.{pattern}"))
            .collect::<Vec<_>>()
            .join(",");
        self.select(
            MESSAGES_TABLE,
            vec![
                ("or", format!("({filter})")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn list_messages_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<ContactMessage>> {
        self.select(
            MESSAGES_TABLE,
            vec![
                ("created_at", format!("gte.{}", timestamp(&start))),
                ("created_at", format!("lte.{}", timestamp(&end))),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl PersonalDataStore for RestStore {
    async fn get_personal_data(&self) -> StoreResult<Option<PersonalData>> {
        self.select_one(PERSONAL_DATA_TABLE, vec![("order", "created_at.asc".to_string())])
            .await
    }

    async fn upsert_personal_data(&self, draft: &PersonalDataDraft) -> StoreResult<PersonalData> {
        let draft = draft.clone().normalized();
        match self.get_personal_data().await? {
            Some(existing) => {
                let rows: Vec<PersonalData> = self
                    .patch(
                        PERSONAL_DATA_TABLE,
                        vec![("id", eq(&existing.id))],
                        &with_updated_at(&draft)?,
                    )
                    .await?;
                rows.into_iter()
                    .next()
                    .ok_or_else(|| StoreError::not_found(PERSONAL_DATA_TABLE, existing.id))
            }
            None => self.insert(PERSONAL_DATA_TABLE, &draft).await,
        }
    }
}
