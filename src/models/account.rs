//! User account model

use serde::{Deserialize, Serialize};

use crate::crypto::digest::{hash_secret, verify_secret};

/// A login account: a unique username and its password digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password_hash: String,
}

impl UserAccount {
    /// Create an account from a plaintext password
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_hash: hash_secret(password),
        }
    }

    /// Check a plaintext password against the stored digest
    pub fn verify_password(&self, password: &str) -> bool {
        verify_secret(password, &self.password_hash)
    }

    /// Replace the stored digest
    pub fn set_password(&mut self, password: &str) {
        self.password_hash = hash_secret(password);
    }
}
