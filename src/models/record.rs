//! Encrypted record model
//!
//! An `EncryptedRecord` is one sealed payload owned by one user. Its label is
//! the key it is stored under in the owner's collection, so the record body
//! carries everything except the label. Field names on disk match the store
//! files Sealbox has always written:
//!
//! ```json
//! {
//!   "encrypted_text": "AXy0...",
//!   "passkey": "6ca13d52...",
//!   "timestamp": "2024-03-19 10:15:00",
//!   "type": "file",
//!   "file_info": { "filename": "a.png", "type": "image/png", "size": 1024 }
//! }
//! ```

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::digest::verify_secret;

/// Format of the `timestamp` field
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// MIME type used when an upload does not declare one
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// What kind of payload a record holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// UTF-8 text entered directly
    Text,
    /// Uploaded file bytes
    File,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "TEXT"),
            Self::File => write!(f, "FILE"),
        }
    }
}

/// Metadata describing an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    /// Name of the file as uploaded
    #[serde(rename = "filename")]
    pub original_name: String,

    /// Declared MIME type
    #[serde(rename = "type")]
    pub mime_type: String,

    /// Plaintext size in bytes
    #[serde(rename = "size")]
    pub size_bytes: u64,
}

impl FileMeta {
    pub fn new(original_name: impl Into<String>, mime_type: Option<&str>, size_bytes: u64) -> Self {
        let mime_type = mime_type
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE);
        Self {
            original_name: original_name.into(),
            mime_type: mime_type.to_string(),
            size_bytes,
        }
    }

    /// Whether the content can reasonably be shown as text
    pub fn is_text_like(&self) -> bool {
        self.mime_type.starts_with("text")
            || matches!(
                self.mime_type.as_str(),
                "application/json" | "application/xml"
            )
    }

    /// Whether the content is an image
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image")
    }
}

/// A sealed payload stored under a label in its owner's collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    /// Cipher token produced by the session cipher
    #[serde(rename = "encrypted_text")]
    pub ciphertext: String,

    /// SHA-256 hex digest of the passkey that guards this record
    #[serde(rename = "passkey")]
    pub passkey_hash: String,

    /// When the record was created (local time)
    #[serde(rename = "timestamp", with = "timestamp_format")]
    pub created_at: NaiveDateTime,

    /// Payload kind
    #[serde(rename = "type")]
    pub kind: RecordKind,

    /// File details, present for file records only
    #[serde(
        rename = "file_info",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub file_meta: Option<FileMeta>,
}

impl EncryptedRecord {
    /// Create a text record stamped with the current local time
    pub fn text(ciphertext: String, passkey_hash: String) -> Self {
        Self {
            ciphertext,
            passkey_hash,
            created_at: now_local(),
            kind: RecordKind::Text,
            file_meta: None,
        }
    }

    /// Create a file record stamped with the current local time
    pub fn file(ciphertext: String, passkey_hash: String, meta: FileMeta) -> Self {
        Self {
            ciphertext,
            passkey_hash,
            created_at: now_local(),
            kind: RecordKind::File,
            file_meta: Some(meta),
        }
    }

    /// Check a passkey against the stored digest
    pub fn passkey_matches(&self, passkey: &str) -> bool {
        verify_secret(passkey, &self.passkey_hash)
    }

    /// Length of the stored cipher token
    pub fn encrypted_size(&self) -> usize {
        self.ciphertext.len()
    }
}

/// Current local time truncated to whole seconds, matching the stored precision
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
