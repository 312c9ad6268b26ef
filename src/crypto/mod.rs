//! Cryptographic functions for Sealbox
//!
//! Provides the AES-256-GCM session cipher, unsalted SHA-256 digests for
//! passwords and passkeys, and zeroizing containers for secrets.

pub mod cipher;
pub mod digest;
pub mod secure_memory;

pub use cipher::PasskeyCipher;
pub use digest::{hash_secret, verify_secret};
pub use secure_memory::SecureString;
