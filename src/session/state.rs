//! Per-session state

use chrono::{DateTime, Utc};

use crate::auth::LockoutGuard;
use crate::config::Settings;
use crate::crypto::PasskeyCipher;
use crate::error::{SealboxError, SealboxResult};

/// State of one caller's session
///
/// The cipher is created with the session and lives exactly as long as it,
/// including across logout and re-login.
#[derive(Debug)]
pub struct SessionState {
    username: Option<String>,
    lockout: LockoutGuard,
    last_activity: DateTime<Utc>,
    cipher: PasskeyCipher,
}

impl SessionState {
    /// Start an unauthenticated session with a fresh cipher key
    pub fn new(settings: &Settings) -> Self {
        Self::with_cipher(settings, PasskeyCipher::generate())
    }

    pub fn with_cipher(settings: &Settings, cipher: PasskeyCipher) -> Self {
        Self {
            username: None,
            lockout: LockoutGuard::new(settings.lockout_threshold, settings.lockout_duration),
            last_activity: Utc::now(),
            cipher,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Username of the logged-in user, or `NotAuthenticated`
    pub fn require_user(&self) -> SealboxResult<&str> {
        self.username().ok_or(SealboxError::NotAuthenticated)
    }

    pub fn lockout(&self) -> &LockoutGuard {
        &self.lockout
    }

    pub fn lockout_mut(&mut self) -> &mut LockoutGuard {
        &mut self.lockout
    }

    pub fn failed_attempts(&self) -> u32 {
        self.lockout.failed_attempts()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn cipher(&self) -> &PasskeyCipher {
        &self.cipher
    }

    /// Mark the session as logged in and clear the failure count
    pub fn login(&mut self, username: impl Into<String>, now: DateTime<Utc>) {
        self.username = Some(username.into());
        self.lockout.record_success();
        self.last_activity = now;
    }

    /// Drop the login; the cipher key and lockout counters stay
    pub fn logout(&mut self) {
        self.username = None;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    /// Whether an authenticated session has been idle past `timeout`
    pub fn is_expired(&self, timeout: std::time::Duration, now: DateTime<Utc>) -> bool {
        if !self.is_authenticated() {
            return false;
        }
        // Negative idle time (clock moved back) never expires a session
        match (now - self.last_activity).to_std() {
            Ok(idle) => idle > timeout,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_session_is_anonymous() {
        let state = SessionState::new(&Settings::default());
        assert!(!state.is_authenticated());
        assert!(matches!(
            state.require_user(),
            Err(SealboxError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_login_logout() {
        let mut state = SessionState::new(&Settings::default());
        let now = Utc::now();
        state.lockout_mut().record_failure(now);

        state.login("admin", now);
        assert_eq!(state.require_user().unwrap(), "admin");
        assert_eq!(state.failed_attempts(), 0);

        state.logout();
        assert!(!state.is_authenticated());
    }

    #[test]
    fn test_cipher_survives_logout() {
        let mut state = SessionState::new(&Settings::default());
        state.login("admin", Utc::now());
        let token = state.cipher().encrypt(b"kept").unwrap();

        state.logout();
        state.login("admin", Utc::now());
        assert_eq!(state.cipher().decrypt(&token).unwrap(), b"kept");
    }

    #[test]
    fn test_expiry() {
        let mut state = SessionState::new(&Settings::default());
        let t0 = Utc::now();
        let timeout = std::time::Duration::from_secs(60);

        assert!(!state.is_expired(timeout, t0 + Duration::seconds(3600)));

        state.login("admin", t0);
        assert!(!state.is_expired(timeout, t0 + Duration::seconds(60)));
        assert!(state.is_expired(timeout, t0 + Duration::seconds(61)));

        state.touch(t0 + Duration::seconds(61));
        assert!(!state.is_expired(timeout, t0 + Duration::seconds(62)));
    }

    #[test]
    fn test_expiry_edges() {
        let mut state = SessionState::new(&Settings::default());
        let t0 = Utc::now();
        state.login("admin", t0);

        let timeout = std::time::Duration::from_secs(60);
        assert!(!state.is_expired(timeout, t0 - Duration::seconds(600)));

        let forever = std::time::Duration::from_secs(u64::MAX);
        assert!(!state.is_expired(forever, t0 + Duration::days(3650)));
    }
}
