//! Centralized error types for Folio.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling throughout the codebase
//! - Provides user-friendly messages suitable for the admin dashboard
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Top-level application error type.
///
/// Service-level errors convert into this type. Use `user_message()` to get
/// a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("GitHub API error: {0}")]
    GitHub(#[from] GitHubError),

    #[error("Email delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Input rejected before anything was persisted.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Service-level errors (sync, contact, etc.) mapped from the services crate.
    #[error("Service error: {0}")]
    Service(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    ///
    /// These messages are designed to be actionable and non-technical.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Database(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::GitHub(e) => e.user_message(),
            AppError::Delivery(e) => e.user_message(),
            AppError::Validation(_) => "Some fields are invalid. Please review the form.",
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Service(_) => "Something went wrong. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The server is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Persistent store errors (SQLite or hosted database).
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => {
                "Unable to reach the content database. Please try again."
            }
            DatabaseError::QueryFailed(_) => "A data operation failed. Please try again.",
            DatabaseError::Constraint(_) => "This record conflicts with existing data.",
            DatabaseError::Corruption(_) => {
                "Stored data may be corrupted. Consider restoring a backup."
            }
            DatabaseError::MigrationFailed(_) => {
                "Failed to update the database schema. Try restarting."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}

/// GitHub directory errors as seen by the dashboard.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub account not found: {handle}")]
    AccountNotFound { handle: String },

    #[error("Rate limited by GitHub")]
    RateLimited,

    #[error("Unauthorized - token may be invalid or expired")]
    Unauthorized,

    #[error("Forbidden - insufficient permissions")]
    Forbidden,

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("GitHub sync is not configured")]
    NotConfigured,

    #[error("GitHub sync is disabled")]
    SyncDisabled,
}

impl GitHubError {
    /// Create a GitHubError from an arbitrary message.
    /// Uses status 0 to indicate non-HTTP origin.
    pub fn message(msg: impl Into<String>) -> Self {
        GitHubError::ApiError {
            status: 0,
            message: msg.into(),
        }
    }

    /// Classify an HTTP status returned by the GitHub API.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 => GitHubError::Unauthorized,
            403 | 429 => GitHubError::RateLimited,
            _ => GitHubError::ApiError {
                status,
                message: message.into(),
            },
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            GitHubError::AccountNotFound { .. } => {
                "GitHub user not found. Check the username and try again."
            }
            GitHubError::RateLimited => "GitHub rate limit exceeded. Please wait and try again.",
            GitHubError::Unauthorized => "GitHub rejected the configured token.",
            GitHubError::Forbidden => "You don't have permission to access this resource.",
            GitHubError::ApiError { status, .. } if *status >= 500 => {
                "GitHub is experiencing issues. Please try again later."
            }
            GitHubError::ApiError { .. } => "GitHub request failed. Please try again.",
            GitHubError::NotConfigured => "Configure a GitHub account before syncing.",
            GitHubError::SyncDisabled => "GitHub sync is turned off. Enable it to sync projects.",
        }
    }
}

/// Email delivery errors (contact form).
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Delivery endpoint rejected the message: {status} - {message}")]
    Rejected { status: u16, message: String },

    #[error("Delivery endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Message saved ({message_id}) but not delivered: {reason}")]
    SavedNotDelivered { message_id: String, reason: String },
}

impl DeliveryError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DeliveryError::Rejected { .. } | DeliveryError::Unreachable(_) => {
                "Your message could not be sent. Please try again."
            }
            DeliveryError::SavedNotDelivered { .. } => {
                "Your message was saved but the email notification failed. Please try again."
            }
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DatabaseError::Constraint(self.to_string())
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                DatabaseError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                DatabaseError::ConnectionFailed(self.to_string())
            }
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}
