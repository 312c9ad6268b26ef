//! Core data models for Sealbox
//!
//! This module contains the data structures of the vault domain: user
//! accounts, encrypted records, store requests and their results, and
//! session identifiers.

pub mod account;
pub mod record;
pub mod request;
pub mod session_id;

pub use account::UserAccount;
pub use record::{EncryptedRecord, FileMeta, RecordKind};
pub use request::{DecryptedPayload, Payload, RecordSummary, StoreRequest, StoreValidationError};
pub use session_id::SessionId;
