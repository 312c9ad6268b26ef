//! Sealbox - passkey-gated encryption of text and file records
//!
//! Authenticated users seal text or files under a passkey and later recover
//! them by presenting the same passkey. The sealed records live in a single
//! JSON document with rolling backups and corruption recovery.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Settings and path management
//! - `error`: Custom error types
//! - `crypto`: Session cipher, secret digests and zeroizing strings
//! - `models`: Records, accounts, requests and session ids
//! - `auth`: Credential store and brute-force lockout
//! - `session`: Per-session state and the session registry
//! - `storage`: In-memory record store and JSON persistence
//! - `backup`: Backup naming, retention and restore
//! - `audit`: Append-only audit trail
//! - `services`: The `Vault` request/response API
//! - `display`, `cli`: Terminal front end
//!
//! # Example
//!
//! ```rust,ignore
//! use sealbox::{Settings, StoreRequest, Vault};
//!
//! let (vault, _report) = Vault::open(Settings::from_env()?)?;
//! let session = vault.start_session()?;
//! vault.authenticate(session, "admin", "admin123")?;
//! vault.store_record(session, StoreRequest::text("note1", "hello", "abc123", "abc123"))?;
//! let payload = vault.retrieve_record(session, "note1", "abc123")?;
//! assert_eq!(payload.as_text()?, "hello");
//! ```

pub mod audit;
pub mod auth;
pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod storage;

pub use config::Settings;
pub use error::{ErrorCategory, SealboxError, SealboxResult};
pub use models::{DecryptedPayload, RecordKind, RecordSummary, SessionId, StoreRequest};
pub use services::Vault;
pub use storage::LoadStatus;
