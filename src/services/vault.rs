//! Vault service
//!
//! The core API. Every operation takes the caller's `SessionId`; operations
//! that need a login check the session timeout first, so an expired session
//! fails with `SessionExpired` before anything else happens.
//!
//! Lock order is sessions, then records. Record mutations hold the records
//! write lock across the save so snapshots reach disk in mutation order.

use std::sync::RwLock;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::audit::{AuditEntry, AuditLogger, EntityType, Operation};
use crate::auth::{CredentialStore, LockState};
use crate::backup::{BackupInfo, RestoreManager, RestoreResult, ValidationResult};
use crate::config::Settings;
use crate::crypto::{hash_secret, PasskeyCipher};
use crate::error::{SealboxError, SealboxResult};
use crate::models::{
    DecryptedPayload, EncryptedRecord, RecordSummary, SessionId, StoreRequest,
};
use crate::session::{SessionManager, SessionState};
use crate::storage::{LoadStatus, PersistenceLayer, RecordStore};

/// What happened while opening the vault
#[derive(Debug)]
pub struct OpenReport {
    pub status: LoadStatus,
    /// `CorruptStore` when the data file could not be read cleanly
    pub warning: Option<SealboxError>,
    pub record_count: usize,
}

/// Login state of a session, for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStatus {
    pub username: Option<String>,
    pub failed_attempts: u32,
    pub attempts_remaining: u32,
    /// Seconds until a lockout ends, if one is active
    pub locked_for_secs: Option<u64>,
}

/// The encrypted record vault
pub struct Vault {
    settings: Settings,
    credentials: CredentialStore,
    sessions: SessionManager,
    records: RwLock<RecordStore>,
    persistence: PersistenceLayer,
    audit: Option<AuditLogger>,
}

impl Vault {
    /// Open the vault with the demo accounts
    pub fn open(settings: Settings) -> SealboxResult<(Self, OpenReport)> {
        Self::open_with_credentials(settings, CredentialStore::with_demo_accounts())
    }

    /// Open the vault with a specific credential store
    ///
    /// A corrupt data file is not an error: the vault opens with whatever
    /// could be recovered and the report carries the warning.
    pub fn open_with_credentials(
        settings: Settings,
        credentials: CredentialStore,
    ) -> SealboxResult<(Self, OpenReport)> {
        settings.validate()?;

        let persistence = PersistenceLayer::new(settings.paths(), settings.backup_retention);
        let outcome = persistence.load()?;
        if let Some(warning) = &outcome.warning {
            warn!("{}", warning);
        }

        let report = OpenReport {
            status: outcome.status,
            warning: outcome.warning,
            record_count: outcome.store.record_count(),
        };

        let audit = settings.audit_log.clone().map(AuditLogger::new);

        info!(
            data_file = %settings.data_file.display(),
            records = report.record_count,
            "Vault opened"
        );

        let vault = Self {
            settings,
            credentials,
            sessions: SessionManager::new(),
            records: RwLock::new(outcome.store),
            persistence,
            audit,
        };

        Ok((vault, report))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn persistence(&self) -> &PersistenceLayer {
        &self.persistence
    }

    pub fn audit_log(&self) -> Option<&AuditLogger> {
        self.audit.as_ref()
    }

    // Sessions

    /// Create a session with a fresh cipher key
    pub fn start_session(&self) -> SealboxResult<SessionId> {
        let id = self.sessions.start(&self.settings)?;
        info!(session = %id, "Session started");
        Ok(id)
    }

    /// Destroy a session and its cipher key
    pub fn end_session(&self, id: SessionId) -> SealboxResult<()> {
        let state = self
            .sessions
            .end(id)?
            .ok_or_else(|| SealboxError::UnknownSession(id.to_string()))?;

        if let Some(username) = state.username() {
            self.audit(AuditEntry::user(Operation::Logout, username).with_detail("session ended"));
        }
        info!(session = %id, "Session ended");
        Ok(())
    }

    /// Enforce the session timeout and refresh the activity time
    pub fn check_session(&self, id: SessionId) -> SealboxResult<()> {
        self.sessions
            .with_session(id, |state| self.ensure_active(id, state))
    }

    pub fn is_authenticated(&self, id: SessionId) -> SealboxResult<bool> {
        self.sessions
            .with_session(id, |state| Ok(state.is_authenticated()))
    }

    pub fn login_status(&self, id: SessionId) -> SealboxResult<LoginStatus> {
        self.sessions.with_session(id, |state| {
            Ok(LoginStatus {
                username: state.username().map(str::to_string),
                failed_attempts: state.failed_attempts(),
                attempts_remaining: state.lockout().attempts_remaining(),
                locked_for_secs: state.lockout().locked_for_secs(Utc::now()),
            })
        })
    }

    // Authentication

    /// Log a session in
    ///
    /// Rejected with `LockedOut` while the session is locked, without
    /// looking at the credentials.
    pub fn authenticate(&self, id: SessionId, username: &str, password: &str) -> SealboxResult<()> {
        self.sessions.with_session(id, |state| {
            let now = Utc::now();

            if let Err(e) = state.lockout().check(now) {
                warn!(session = %id, username, "Login attempt during lockout");
                self.audit(
                    AuditEntry::user(Operation::LockedOut, username)
                        .with_detail("attempt rejected during lockout"),
                );
                return Err(e);
            }

            if self.credentials.authenticate(username, password)? {
                state.login(username, now);
                info!(session = %id, username, "Login succeeded");
                self.audit(AuditEntry::user(Operation::Login, username));
                return Ok(());
            }

            let lock_state = state.lockout_mut().record_failure(now);
            let attempts = state.failed_attempts();
            warn!(session = %id, username, attempts, "Login failed");
            self.audit(
                AuditEntry::user(Operation::LoginFailed, username)
                    .with_detail(format!("failed attempt {}", attempts)),
            );

            if let LockState::Locked { until } = lock_state {
                warn!(session = %id, until = %until, "Session locked out");
                self.audit(
                    AuditEntry::user(Operation::LockedOut, username)
                        .with_detail(format!("locked until {}", until.format("%H:%M:%S UTC"))),
                );
            }

            Err(SealboxError::AuthenticationFailure)
        })
    }

    /// Log a session out; the session and its key stay alive
    pub fn logout(&self, id: SessionId) -> SealboxResult<()> {
        self.sessions.with_session(id, |state| {
            if let Some(username) = state.username().map(str::to_string) {
                state.logout();
                info!(session = %id, username = %username, "Logged out");
                self.audit(AuditEntry::user(Operation::Logout, username));
            }
            Ok(())
        })
    }

    /// Change the logged-in user's password, then log the session out
    pub fn change_password(
        &self,
        id: SessionId,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> SealboxResult<()> {
        self.sessions.with_session(id, |state| {
            self.ensure_active(id, state)?;
            let username = state.require_user()?.to_string();

            if new_password.is_empty() {
                return Err(SealboxError::validation("New password cannot be empty"));
            }
            if new_password != confirm_password {
                return Err(SealboxError::validation("New passwords do not match"));
            }

            if !self
                .credentials
                .change_password(&username, old_password, new_password)?
            {
                warn!(session = %id, username = %username, "Password change rejected");
                return Err(SealboxError::AuthenticationFailure);
            }

            state.logout();
            info!(session = %id, username = %username, "Password changed, session logged out");
            self.audit(AuditEntry::user(Operation::PasswordChange, username));
            Ok(())
        })
    }

    // Records

    /// Validate, encrypt and persist a record
    pub fn store_record(&self, id: SessionId, request: StoreRequest) -> SealboxResult<RecordSummary> {
        let (owner, label, record) = self.with_user(id, |owner, cipher| {
            request
                .validate(self.settings.max_file_size)
                .map_err(|e| SealboxError::Validation(e.to_string()))?;

            let ciphertext = cipher.encrypt(request.payload.as_bytes())?;
            let passkey_hash = hash_secret(&request.passkey);
            let record = match request.file_meta() {
                Some(meta) => EncryptedRecord::file(ciphertext, passkey_hash, meta),
                None => EncryptedRecord::text(ciphertext, passkey_hash),
            };

            Ok((owner.to_string(), request.trimmed_label().to_string(), record))
        })?;

        let summary = RecordSummary::from_record(&label, &record);
        let kind = record.kind;

        self.mutate_records(&owner, |store| {
            store.put(&owner, label.clone(), record);
        })?;

        info!(owner = %owner, label = %label, kind = %kind, "Record stored");
        self.audit(
            AuditEntry::record(Operation::Create, &owner, &label).with_detail(kind.to_string()),
        );
        Ok(summary)
    }

    /// Decrypt a record after checking its passkey
    ///
    /// A wrong passkey fails with `PasskeyMismatch` without attempting
    /// decryption.
    pub fn retrieve_record(
        &self,
        id: SessionId,
        label: &str,
        passkey: &str,
    ) -> SealboxResult<DecryptedPayload> {
        let label = label.trim();
        self.with_user(id, |owner, cipher| {
            let record = self
                .records
                .read()
                .map_err(|e| {
                    SealboxError::Persistence(format!("Failed to acquire read lock: {}", e))
                })?
                .get(owner, label)
                .cloned()
                .ok_or_else(|| SealboxError::record_not_found(label))?;

            if !record.passkey_matches(passkey) {
                warn!(owner, label, "Wrong passkey");
                self.audit(
                    AuditEntry::record(Operation::AccessDenied, owner, label)
                        .with_detail("wrong passkey"),
                );
                return Err(SealboxError::PasskeyMismatch);
            }

            let bytes = match cipher.decrypt(&record.ciphertext) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(owner, label, error = %e, "Record could not be decrypted");
                    self.audit(
                        AuditEntry::record(Operation::AccessDenied, owner, label)
                            .with_detail("decryption failed"),
                    );
                    return Err(e);
                }
            };

            debug!(owner, label, "Record decrypted");
            self.audit(AuditEntry::record(Operation::Access, owner, label));

            Ok(DecryptedPayload {
                label: label.to_string(),
                kind: record.kind,
                bytes,
                file_meta: record.file_meta,
            })
        })
    }

    /// Delete one of the user's records
    ///
    /// Returns `false` when there was nothing to delete.
    pub fn delete_record(&self, id: SessionId, label: &str) -> SealboxResult<bool> {
        let label = label.trim();
        let owner = self.with_user(id, |owner, _| Ok(owner.to_string()))?;

        let removed = self.mutate_records(&owner, |store| store.delete(&owner, label).is_some())?;

        if removed {
            info!(owner = %owner, label, "Record deleted");
            self.audit(AuditEntry::record(Operation::Delete, &owner, label));
        }
        Ok(removed)
    }

    /// Summaries of the user's records in insertion order
    pub fn list_records(&self, id: SessionId) -> SealboxResult<Vec<RecordSummary>> {
        let owner = self.with_user(id, |owner, _| Ok(owner.to_string()))?;

        let store = self.records.read().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(store
            .list_by_owner(&owner)
            .into_iter()
            .map(|(label, record)| RecordSummary::from_record(label, record))
            .collect())
    }

    // Backups

    pub fn list_backups(&self) -> SealboxResult<Vec<BackupInfo>> {
        self.persistence.backups().list_backups()
    }

    pub fn validate_backup(&self, name: &str) -> SealboxResult<ValidationResult> {
        let backup = self.persistence.backups().find(name)?;
        RestoreManager::new(&self.persistence).validate_backup(&backup)
    }

    /// Restore a backup over the data file and the in-memory store
    pub fn restore_backup(&self, name: &str) -> SealboxResult<RestoreResult> {
        let backup = self.persistence.backups().find(name)?;

        let mut store = self.records.write().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire write lock: {}", e))
        })?;

        let result = RestoreManager::new(&self.persistence).restore(&backup)?;
        *store = result.store.clone();

        info!(backup = %result.restored_from, records = result.record_count, "Backup restored");
        self.audit(
            AuditEntry::new(Operation::Restore, EntityType::Backup, &result.restored_from)
                .with_detail(result.summary()),
        );
        Ok(result)
    }

    // Internals

    /// Log an expired session out, or refresh its activity time
    fn ensure_active(&self, id: SessionId, state: &mut SessionState) -> SealboxResult<()> {
        let now = Utc::now();
        if state.is_expired(self.settings.session_timeout, now) {
            let username = state.username().unwrap_or_default().to_string();
            state.logout();
            info!(session = %id, username = %username, "Session expired");
            self.audit(AuditEntry::user(Operation::SessionExpired, username));
            return Err(SealboxError::SessionExpired);
        }
        state.touch(now);
        Ok(())
    }

    /// Run `f` with the logged-in username and the session cipher
    fn with_user<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&str, &PasskeyCipher) -> SealboxResult<T>,
    ) -> SealboxResult<T> {
        self.sessions.with_session(id, |state| {
            self.ensure_active(id, state)?;
            let username = state.require_user()?;
            f(username, state.cipher())
        })
    }

    /// Apply a mutation to one owner's records and persist it
    ///
    /// If the save fails the owner's collection is put back as it was.
    fn mutate_records<T>(
        &self,
        owner: &str,
        mutate: impl FnOnce(&mut RecordStore) -> T,
    ) -> SealboxResult<T> {
        let mut store = self.records.write().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire write lock: {}", e))
        })?;

        let snapshot = store.owner_snapshot(owner);
        let result = mutate(&mut store);

        // Nothing changed, nothing to write
        if store.owner_snapshot(owner) == snapshot {
            return Ok(result);
        }

        if let Err(e) = self.persistence.save(&store) {
            store.restore_owner(owner, snapshot);
            warn!(owner, error = %e, "Save failed, change rolled back");
            return Err(e);
        }

        Ok(result)
    }

    fn audit(&self, entry: AuditEntry) {
        if let Some(logger) = &self.audit {
            if let Err(e) = logger.log(&entry) {
                warn!(error = %e, "Failed to write audit entry");
            }
        }
    }
}
