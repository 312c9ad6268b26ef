//! Credential store
//!
//! Holds username → password digest mappings in memory. Accounts are seeded
//! at startup and are never created or deleted afterwards; only their
//! password can change.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::error::{SealboxError, SealboxResult};
use crate::models::UserAccount;

/// Accounts available on every start
pub const DEMO_ACCOUNTS: [(&str, &str); 2] = [("admin", "admin123"), ("user1", "password1")];

/// In-memory credential store shared by all sessions
pub struct CredentialStore {
    accounts: RwLock<HashMap<String, UserAccount>>,
}

impl CredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store holding the demo accounts
    pub fn with_demo_accounts() -> Self {
        Self::from_accounts(
            DEMO_ACCOUNTS
                .iter()
                .map(|(username, password)| UserAccount::new(*username, password)),
        )
    }

    /// Create a store from existing accounts
    pub fn from_accounts(accounts: impl IntoIterator<Item = UserAccount>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|a| (a.username.clone(), a))
            .collect();
        Self {
            accounts: RwLock::new(accounts),
        }
    }

    /// Check a username/password pair
    ///
    /// Unknown usernames are indistinguishable from wrong passwords.
    pub fn authenticate(&self, username: &str, password: &str) -> SealboxResult<bool> {
        let accounts = self.accounts.read().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(accounts
            .get(username)
            .map(|account| account.verify_password(password))
            .unwrap_or(false))
    }

    /// Replace a password after verifying the old one
    ///
    /// Returns `false` and leaves the account untouched when the user is
    /// unknown or the old password is wrong.
    pub fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> SealboxResult<bool> {
        let mut accounts = self.accounts.write().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire write lock: {}", e))
        })?;

        match accounts.get_mut(username) {
            Some(account) if account.verify_password(old_password) => {
                account.set_password(new_password);
                debug!(username, "Password digest replaced");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Check if a username exists
    pub fn contains(&self, username: &str) -> SealboxResult<bool> {
        let accounts = self.accounts.read().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(accounts.contains_key(username))
    }

    /// All usernames, sorted
    pub fn usernames(&self) -> SealboxResult<Vec<String>> {
        let accounts = self.accounts.read().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut names: Vec<_> = accounts.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::with_demo_accounts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_accounts_authenticate() {
        let store = CredentialStore::with_demo_accounts();
        assert!(store.authenticate("admin", "admin123").unwrap());
        assert!(store.authenticate("user1", "password1").unwrap());
        assert_eq!(store.usernames().unwrap(), vec!["admin", "user1"]);
    }

    #[test]
    fn test_wrong_password_and_unknown_user() {
        let store = CredentialStore::with_demo_accounts();
        assert!(!store.authenticate("admin", "nope").unwrap());
        assert!(!store.authenticate("ghost", "admin123").unwrap());
        assert!(!store.authenticate("Admin", "admin123").unwrap());
    }

    #[test]
    fn test_change_password() {
        let store = CredentialStore::with_demo_accounts();

        assert!(store.change_password("admin", "admin123", "s3cret").unwrap());
        assert!(!store.authenticate("admin", "admin123").unwrap());
        assert!(store.authenticate("admin", "s3cret").unwrap());
    }

    #[test]
    fn test_change_password_wrong_old_is_noop() {
        let store = CredentialStore::with_demo_accounts();

        assert!(!store.change_password("admin", "wrong", "s3cret").unwrap());
        assert!(store.authenticate("admin", "admin123").unwrap());
        assert!(!store.change_password("ghost", "x", "y").unwrap());
        assert!(!store.contains("ghost").unwrap());
    }

    #[test]
    fn test_empty_store() {
        let store = CredentialStore::new();
        assert!(!store.authenticate("admin", "admin123").unwrap());
    }
}
