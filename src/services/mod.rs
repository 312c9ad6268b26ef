//! Service layer for Sealbox
//!
//! `Vault` is the request/response API every front end calls. It ties the
//! credential store, sessions, record store, persistence and audit trail
//! together and enforces session timeout, lockout and the passkey gate.

pub mod vault;

pub use vault::{LoginStatus, OpenReport, Vault};
