//! Portfolio content records shared by every store backend.
//!
//! Field names follow the hosted database's column names so the same types
//! deserialize from REST rows and map onto SQLite columns.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status shown on a project card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    InProgress,
    Completed,
}

impl ProjectStatus {
    /// Wire/column representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::InProgress => "in-progress",
            ProjectStatus::Completed => "completed",
        }
    }

    /// Parse the wire/column representation
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in-progress" => Some(ProjectStatus::InProgress),
            "completed" => Some(ProjectStatus::Completed),
            _ => None,
        }
    }
}

/// The singleton GitHub sync configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(rename = "username")]
    pub account_handle: String,
    /// Repository names chosen for display, in selection order
    #[serde(default)]
    pub selected_repos: Vec<String>,
    pub sync_enabled: bool,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
}

impl SyncConfig {
    /// A freshly configured account: sync enabled, never synced.
    pub fn new(account_handle: impl Into<String>, selected_repos: Vec<String>) -> Self {
        Self {
            account_handle: account_handle.into(),
            selected_repos,
            sync_enabled: true,
            last_sync: None,
        }
    }

    pub fn has_selection(&self) -> bool {
        !self.selected_repos.is_empty()
    }
}

/// A project shown in the portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    pub github_url: String,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub status: ProjectStatus,
    /// Immutable GitHub repository id; the reconciliation match key
    #[serde(default)]
    pub github_repo_id: Option<i64>,
    #[serde(default)]
    pub github_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    /// Technology tags match case-insensitively; order is irrelevant.
    pub fn has_technology(&self, technology: &str) -> bool {
        self.technologies
            .iter()
            .any(|t| t.eq_ignore_ascii_case(technology))
    }
}

/// Fields for creating a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub github_url: String,
    pub demo_url: Option<String>,
    pub image_url: Option<String>,
    pub technologies: Vec<String>,
    pub status: ProjectStatus,
    pub github_repo_id: Option<i64>,
    pub github_updated_at: Option<DateTime<Utc>>,
}

/// Partial project update; only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_repo_id: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_updated_at: Option<Option<DateTime<Utc>>>,
}

impl ProjectUpdate {
    /// An update that overwrites every draft-controlled field. Image is kept,
    /// since synced drafts never carry one.
    pub fn replace_with(draft: &ProjectDraft) -> Self {
        Self {
            name: Some(draft.name.clone()),
            description: Some(draft.description.clone()),
            long_description: Some(draft.long_description.clone()),
            github_url: Some(draft.github_url.clone()),
            demo_url: Some(draft.demo_url.clone()),
            image_url: draft.image_url.clone().map(Some),
            technologies: Some(draft.technologies.clone()),
            status: Some(draft.status),
            github_repo_id: Some(draft.github_repo_id),
            github_updated_at: Some(draft.github_updated_at),
        }
    }

    /// Apply this update onto an in-memory record.
    pub fn apply_to(&self, record: &mut ProjectRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(long_description) = &self.long_description {
            record.long_description = long_description.clone();
        }
        if let Some(github_url) = &self.github_url {
            record.github_url = github_url.clone();
        }
        if let Some(demo_url) = &self.demo_url {
            record.demo_url = demo_url.clone();
        }
        if let Some(image_url) = &self.image_url {
            record.image_url = image_url.clone();
        }
        if let Some(technologies) = &self.technologies {
            record.technologies = technologies.clone();
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(github_repo_id) = self.github_repo_id {
            record.github_repo_id = github_repo_id;
        }
        if let Some(github_updated_at) = self.github_updated_at {
            record.github_updated_at = github_updated_at;
        }
    }
}

/// A certification listed on the portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub id: String,
    pub name: String,
    pub institution: String,
    pub date_obtained: NaiveDate,
    #[serde(default)]
    pub verification_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationDraft {
    pub name: String,
    pub institution: String,
    pub date_obtained: NaiveDate,
    pub verification_url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CertificationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_obtained: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
}

impl CertificationUpdate {
    pub fn apply_to(&self, record: &mut Certification) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(institution) = &self.institution {
            record.institution = institution.clone();
        }
        if let Some(date_obtained) = self.date_obtained {
            record.date_obtained = date_obtained;
        }
        if let Some(verification_url) = &self.verification_url {
            record.verification_url = verification_url.clone();
        }
        if let Some(image_url) = &self.image_url {
            record.image_url = image_url.clone();
        }
    }
}

/// A message left through the public contact form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub read_status: bool,
    pub created_at: DateTime<Utc>,
}

/// Contact form submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Owner details rendered in the hero, about and contact sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalData {
    pub id: String,
    pub full_name: String,
    pub profession: String,
    #[serde(default)]
    pub hero_description: Option<String>,
    #[serde(default)]
    pub about_description: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub github_username: Option<String>,
    #[serde(default)]
    pub cv_url: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersonalData {
    /// `https://wa.me/` link for the WhatsApp number, with an optional
    /// prefilled message. `None` when no number with digits is set.
    pub fn whatsapp_url(&self, message: Option<&str>) -> Option<String> {
        let digits: String = self
            .whatsapp_number
            .as_deref()?
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if digits.is_empty() {
            return None;
        }
        match message.filter(|m| !m.is_empty()) {
            Some(message) => Some(format!(
                "https://wa.me/{}?text={}",
                digits,
                urlencoding::encode(message)
            )),
            None => Some(format!("https://wa.me/{digits}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDataDraft {
    pub full_name: String,
    pub profession: String,
    pub hero_description: Option<String>,
    pub about_description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp_number: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_username: Option<String>,
    pub cv_url: Option<String>,
    pub profile_image_url: Option<String>,
}

impl From<PersonalData> for PersonalDataDraft {
    fn from(data: PersonalData) -> Self {
        Self {
            full_name: data.full_name,
            profession: data.profession,
            hero_description: data.hero_description,
            about_description: data.about_description,
            email: data.email,
            phone: data.phone,
            whatsapp_number: data.whatsapp_number,
            linkedin_url: data.linkedin_url,
            github_username: data.github_username,
            cv_url: data.cv_url,
            profile_image_url: data.profile_image_url,
        }
    }
}

impl PersonalDataDraft {
    /// Blank optional fields are stored as NULL.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.hero_description,
            &mut self.about_description,
            &mut self.email,
            &mut self.phone,
            &mut self.whatsapp_number,
            &mut self.linkedin_url,
            &mut self.github_username,
            &mut self.cv_url,
            &mut self.profile_image_url,
        ] {
            if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *field = None;
            }
        }
        self
    }
}
