// crates/folio-services/src/email.rs

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use folio_core::EmailConfig;
use reqwest::{header, Client};
use serde::Serialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum EmailError {
    /// The form-delivery endpoint refused the submission
    #[error("Email endpoint rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Email endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A notification about a new contact message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Serialize)]
struct FormPayload<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
    #[serde(rename = "_replyto")]
    reply_to: &'a str,
    #[serde(rename = "_subject")]
    notification_subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_email: Option<&'a str>,
}

/// Client for a hosted form-to-email endpoint (Formspree style)
#[derive(Debug, Clone)]
pub struct EmailClient {
    endpoint: Url,
    client: Arc<Client>,
    to_email: Option<String>,
}

impl EmailClient {
    pub fn new(endpoint: &str, to_email: Option<String>) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint).context("Invalid email endpoint URL")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint,
            client: Arc::new(client),
            to_email,
        })
    }

    /// `None` when no endpoint is configured
    pub fn from_config(config: &EmailConfig) -> anyhow::Result<Option<Self>> {
        config
            .endpoint
            .as_deref()
            .map(|endpoint| Self::new(endpoint, config.to_email.clone()))
            .transpose()
    }

    /// Deliver a notification e-mail
    pub async fn send_email(&self, email: &EmailMessage) -> Result<(), EmailError> {
        let payload = FormPayload {
            name: &email.name,
            email: &email.email,
            subject: &email.subject,
            message: &email.message,
            reply_to: &email.email,
            notification_subject: format!("New contact message: {}", email.subject),
            to_email: self.to_email.as_deref(),
        };

        tracing::debug!("Sending contact notification for '{}'", email.subject);
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!("Email endpoint returned {}: {}", status, message);
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!("Contact notification delivered");
        Ok(())
    }
}
