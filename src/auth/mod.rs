//! Authentication for Sealbox
//!
//! `CredentialStore` owns the login accounts; `LockoutGuard` throttles
//! repeated failures within one session.

pub mod credentials;
pub mod lockout;

pub use credentials::{CredentialStore, DEMO_ACCOUNTS};
pub use lockout::{LockState, LockoutGuard};
