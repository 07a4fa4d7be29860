//! Public contact form: validation, storage and e-mail notification.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use folio_core::ValidationResult;

use crate::email::{EmailClient, EmailMessage};
use crate::error::ContactError;
use crate::records::{ContactForm, ContactMessage};
use crate::store::{ContactStore, StoreResult};

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;
const MAX_SUBJECT_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 5000;

impl ContactForm {
    /// Check required fields, e-mail shape and length limits on trimmed input
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        for (field, value, max) in [
            ("name", &self.name, MAX_NAME_LEN),
            ("email", &self.email, MAX_EMAIL_LEN),
            ("subject", &self.subject, MAX_SUBJECT_LEN),
            ("message", &self.message, MAX_MESSAGE_LEN),
        ] {
            let value = value.trim();
            if value.is_empty() {
                result.add_error(field, "is required");
            } else if value.chars().count() > max {
                result.add_error(field, format!("must be at most {max} characters"));
            }
        }

        let email = self.email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            result.add_error("email", "is not a valid e-mail address");
        }

        result
    }

    fn trimmed(&self) -> ContactForm {
        ContactForm {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Accepts contact form submissions and serves the admin inbox
pub struct ContactService<S: ContactStore + ?Sized> {
    store: Arc<S>,
    email: Option<EmailClient>,
}

impl<S: ContactStore + ?Sized> ContactService<S> {
    /// `email` is optional; without it messages are only stored
    pub fn new(store: Arc<S>, email: Option<EmailClient>) -> Self {
        Self { store, email }
    }

    /// Validate, persist, then notify.
    ///
    /// # Errors
    /// `Invalid` before anything is stored; `Store` if persisting fails;
    /// `Delivery` if the message was stored but the e-mail failed.
    pub async fn submit(&self, form: &ContactForm) -> Result<ContactMessage, ContactError> {
        let validation = form.validate();
        if !validation.is_valid() {
            tracing::debug!("Rejected contact form: {}", validation.error_summary());
            return Err(ContactError::Invalid(validation));
        }

        let saved = self.store.insert_message(&form.trimmed()).await?;
        tracing::info!("Stored contact message {}", saved.id);

        let Some(email) = &self.email else {
            tracing::warn!("No email endpoint configured; message {} not forwarded", saved.id);
            return Ok(saved);
        };

        let notification = EmailMessage {
            name: saved.name.clone(),
            email: saved.email.clone(),
            subject: saved.subject.clone(),
            message: saved.message.clone(),
        };
        email
            .send_email(&notification)
            .await
            .map_err(|source| ContactError::Delivery {
                message_id: saved.id.clone(),
                source,
            })?;

        Ok(saved)
    }

    pub async fn messages(&self) -> StoreResult<Vec<ContactMessage>> {
        self.store.list_messages().await
    }

    pub async fn unread_messages(&self) -> StoreResult<Vec<ContactMessage>> {
        self.store.list_unread_messages().await
    }

    pub async fn unread_count(&self) -> StoreResult<u64> {
        self.store.unread_count().await
    }

    pub async fn mark_read(&self, id: &str) -> StoreResult<()> {
        self.store.mark_message_read(id).await
    }

    pub async fn mark_all_read(&self) -> StoreResult<()> {
        self.store.mark_all_messages_read().await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete_message(id).await
    }

    pub async fn search(&self, term: &str) -> StoreResult<Vec<ContactMessage>> {
        let term = term.trim();
        if term.is_empty() {
            return self.store.list_messages().await;
        }
        self.store.search_messages(term).await
    }

    pub async fn messages_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<ContactMessage>> {
        self.store.list_messages_between(start, end).await
    }
}
