//! Request and response values exchanged with callers
//!
//! `StoreRequest` is what a front end submits when the user asks to seal
//! something; `DecryptedPayload` and `RecordSummary` are what it gets back.
//! None of these types ever render themselves.

use chrono::NaiveDateTime;
use std::fmt;

use super::record::{EncryptedRecord, FileMeta, RecordKind};
use crate::crypto::SecureString;
use crate::error::{SealboxError, SealboxResult};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Payload of a store request
#[derive(Debug, Clone)]
pub enum Payload {
    Text(String),
    File {
        name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl Payload {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Text(_) => RecordKind::Text,
            Self::File { .. } => RecordKind::File,
        }
    }

    /// Raw plaintext bytes to encrypt
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::File { bytes, .. } => bytes,
        }
    }
}

/// A request to seal a payload under a label and passkey
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub label: String,
    pub payload: Payload,
    pub passkey: SecureString,
    pub confirm_passkey: SecureString,
}

impl StoreRequest {
    /// Build a text request
    pub fn text(
        label: impl Into<String>,
        text: impl Into<String>,
        passkey: impl Into<SecureString>,
        confirm_passkey: impl Into<SecureString>,
    ) -> Self {
        Self {
            label: label.into(),
            payload: Payload::Text(text.into()),
            passkey: passkey.into(),
            confirm_passkey: confirm_passkey.into(),
        }
    }

    /// Build a file request
    pub fn file(
        label: impl Into<String>,
        name: impl Into<String>,
        mime_type: Option<String>,
        bytes: Vec<u8>,
        passkey: impl Into<SecureString>,
        confirm_passkey: impl Into<SecureString>,
    ) -> Self {
        Self {
            label: label.into(),
            payload: Payload::File {
                name: name.into(),
                mime_type,
                bytes,
            },
            passkey: passkey.into(),
            confirm_passkey: confirm_passkey.into(),
        }
    }

    /// Label with surrounding whitespace removed
    pub fn trimmed_label(&self) -> &str {
        self.label.trim()
    }

    /// Validate the request before anything is encrypted
    ///
    /// Checks run in a fixed order so the first problem the user would see is
    /// the one reported.
    pub fn validate(&self, max_file_size: u64) -> Result<(), StoreValidationError> {
        let kind = self.payload.kind();

        if self.trimmed_label().is_empty() {
            return Err(StoreValidationError::MissingLabel(kind));
        }

        match &self.payload {
            Payload::Text(text) if text.trim().is_empty() => {
                return Err(StoreValidationError::MissingPayload(kind));
            }
            Payload::File { name, bytes, .. } => {
                if name.trim().is_empty() && bytes.is_empty() {
                    return Err(StoreValidationError::MissingPayload(kind));
                }
                let size = bytes.len() as u64;
                if size > max_file_size {
                    return Err(StoreValidationError::FileTooLarge {
                        size,
                        max: max_file_size,
                    });
                }
            }
            Payload::Text(_) => {}
        }

        if self.passkey.is_empty() {
            return Err(StoreValidationError::MissingPasskey);
        }

        if self.passkey != self.confirm_passkey {
            return Err(StoreValidationError::PasskeyConfirmation);
        }

        Ok(())
    }

    /// File metadata for file payloads
    pub fn file_meta(&self) -> Option<FileMeta> {
        match &self.payload {
            Payload::Text(_) => None,
            Payload::File {
                name,
                mime_type,
                bytes,
            } => Some(FileMeta::new(
                name.clone(),
                mime_type.as_deref(),
                bytes.len() as u64,
            )),
        }
    }
}

/// Reasons a store request is rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreValidationError {
    MissingLabel(RecordKind),
    MissingPayload(RecordKind),
    FileTooLarge { size: u64, max: u64 },
    MissingPasskey,
    PasskeyConfirmation,
}

impl fmt::Display for StoreValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLabel(RecordKind::Text) => write!(f, "Please provide a data label"),
            Self::MissingLabel(RecordKind::File) => write!(f, "Please provide a file label"),
            Self::MissingPayload(RecordKind::Text) => write!(f, "Please enter data to encrypt"),
            Self::MissingPayload(RecordKind::File) => write!(f, "Please upload a file"),
            Self::FileTooLarge { size, max } => write!(
                f,
                "File size ({:.1}MB) exceeds maximum allowed size ({:.1}MB)",
                *size as f64 / BYTES_PER_MB,
                *max as f64 / BYTES_PER_MB
            ),
            Self::MissingPasskey => write!(f, "Please enter a passkey"),
            Self::PasskeyConfirmation => write!(f, "Passkeys do not match"),
        }
    }
}

impl std::error::Error for StoreValidationError {}

/// Plaintext recovered from a record
#[derive(Debug, Clone)]
pub struct DecryptedPayload {
    pub label: String,
    pub kind: RecordKind,
    pub bytes: Vec<u8>,
    pub file_meta: Option<FileMeta>,
}

impl DecryptedPayload {
    /// Interpret the plaintext as UTF-8
    ///
    /// Binary content fails with `Validation`.
    pub fn as_text(&self) -> SealboxResult<&str> {
        std::str::from_utf8(&self.bytes).map_err(|e| {
            SealboxError::validation(format!(
                "'{}' holds binary content that is not valid UTF-8 text ({})",
                self.label, e
            ))
        })
    }

    /// Whether a text preview makes sense for this payload
    pub fn is_previewable(&self) -> bool {
        match (&self.kind, &self.file_meta) {
            (RecordKind::Text, _) => true,
            (RecordKind::File, Some(meta)) => meta.is_text_like(),
            (RecordKind::File, None) => false,
        }
    }

    /// First `limit` characters of text-like content, with `...` when cut
    pub fn text_preview(&self, limit: usize) -> Option<String> {
        if !self.is_previewable() {
            return None;
        }
        let text = self.as_text().ok()?;
        let mut chars = text.chars();
        let head: String = chars.by_ref().take(limit).collect();
        if chars.next().is_some() {
            Some(format!("{}...", head))
        } else {
            Some(head)
        }
    }
}

/// Listing entry for a record, free of secrets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub label: String,
    pub kind: RecordKind,
    pub created_at: NaiveDateTime,
    pub file_meta: Option<FileMeta>,
    pub encrypted_size: usize,
}

impl RecordSummary {
    pub fn from_record(label: &str, record: &EncryptedRecord) -> Self {
        Self {
            label: label.to_string(),
            kind: record.kind,
            created_at: record.created_at,
            file_meta: record.file_meta.clone(),
            encrypted_size: record.encrypted_size(),
        }
    }
}
