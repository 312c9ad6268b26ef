//! Custom error types for Sealbox
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Every variant renders a message a user can
//! act on: a wrong passkey, corrupted data and a storage failure each read
//! differently because the recovery action differs.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for Sealbox operations
#[derive(Error, Debug)]
pub enum SealboxError {
    /// Bad username or password
    #[error("Authentication failed: invalid username or password")]
    AuthenticationFailure,

    /// Login attempted while the session is in its lockout cooldown
    #[error("Too many failed attempts. Please wait {remaining_secs} seconds before trying again")]
    LockedOut { remaining_secs: u64 },

    /// Supplied passkey does not hash to the record's stored passkey hash
    #[error("Wrong passkey: the passkey does not match this record")]
    PasskeyMismatch,

    /// Ciphertext is corrupt, tampered with, or was sealed under another key
    #[error("Decryption failed, the stored data is corrupted or was encrypted in another session: {0}")]
    Decryption(String),

    /// Missing or malformed request input
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O failure while saving or loading the record store
    #[error("Storage failure: {0}")]
    Persistence(String),

    /// The primary store file could not be parsed
    #[error("Corrupted data file {}: {detail}{}", .path.display(), recovered_note(.recovered_from))]
    CorruptStore {
        path: PathBuf,
        detail: String,
        recovered_from: Option<PathBuf>,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors outside the record store
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Operation requires a logged-in session
    #[error("Not logged in")]
    NotAuthenticated,

    /// Session was idle longer than the configured timeout
    #[error("Your session has expired. Please log in again")]
    SessionExpired,

    /// Session id is not known to the session manager
    #[error("Unknown session: {0}")]
    UnknownSession(String),
}

fn recovered_note(recovered_from: &Option<PathBuf>) -> String {
    match recovered_from {
        Some(backup) => format!(" (data restored from backup {})", backup.display()),
        None => " (no usable backup found, starting empty)".to_string(),
    }
}

/// Coarse classification used by callers to pick a recovery action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Credentials,
    Passkey,
    Corruption,
    Storage,
    Input,
    Session,
    Other,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::Credentials => "credentials",
            ErrorCategory::Passkey => "passkey",
            ErrorCategory::Corruption => "corruption",
            ErrorCategory::Storage => "storage",
            ErrorCategory::Input => "input",
            ErrorCategory::Session => "session",
            ErrorCategory::Other => "other",
        };
        write!(f, "{}", name)
    }
}

impl SealboxError {
    /// Create a "not found" error for records
    pub fn record_not_found(label: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Record",
            identifier: label.into(),
        }
    }

    /// Create a "not found" error for backups
    pub fn backup_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: name.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Corruption the application can start up through
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CorruptStore { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthenticationFailure | Self::LockedOut { .. } => ErrorCategory::Credentials,
            Self::PasskeyMismatch => ErrorCategory::Passkey,
            Self::Decryption(_) | Self::CorruptStore { .. } => ErrorCategory::Corruption,
            Self::Persistence(_) | Self::Io(_) | Self::Json(_) => ErrorCategory::Storage,
            Self::Validation(_) | Self::NotFound { .. } => ErrorCategory::Input,
            Self::NotAuthenticated | Self::SessionExpired | Self::UnknownSession(_) => {
                ErrorCategory::Session
            }
            Self::Config(_) => ErrorCategory::Other,
        }
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for SealboxError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SealboxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Sealbox operations
pub type SealboxResult<T> = Result<T, SealboxError>;
