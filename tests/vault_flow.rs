//! End-to-end flows through the `Vault` API

use std::fs;
use std::thread;
use std::time::Duration;

use sealbox::{LoadStatus, RecordKind, SealboxError, Settings, StoreRequest, Vault};
use tempfile::TempDir;

fn settings(dir: &TempDir) -> Settings {
    Settings::with_data_file(dir.path().join("data.json"))
}

fn logged_in(vault: &Vault, username: &str, password: &str) -> sealbox::SessionId {
    let id = vault.start_session().unwrap();
    vault.authenticate(id, username, password).unwrap();
    id
}

#[test]
fn store_then_retrieve_text() {
    let dir = TempDir::new().unwrap();
    let (vault, report) = Vault::open(settings(&dir)).unwrap();
    assert_eq!(report.status, LoadStatus::Missing);

    let id = logged_in(&vault, "admin", "admin123");
    let summary = vault
        .store_record(id, StoreRequest::text("note1", "hello", "abc123", "abc123"))
        .unwrap();
    assert_eq!(summary.label, "note1");
    assert_eq!(summary.kind, RecordKind::Text);

    let payload = vault.retrieve_record(id, "note1", "abc123").unwrap();
    assert_eq!(payload.as_text().unwrap(), "hello");

    let wrong = vault.retrieve_record(id, "note1", "abc124");
    assert!(matches!(wrong, Err(SealboxError::PasskeyMismatch)));

    // The data file holds ciphertext only
    let raw = fs::read_to_string(dir.path().join("data.json")).unwrap();
    assert!(raw.contains("\"note1\""));
    assert!(!raw.contains("hello"));
    assert!(!raw.contains("abc123"));
}

#[test]
fn mismatched_confirmation_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (vault, _) = Vault::open(settings(&dir)).unwrap();
    let id = logged_in(&vault, "admin", "admin123");

    let result = vault.store_record(id, StoreRequest::text("note1", "hello", "abc123", "abc999"));
    match result {
        Err(SealboxError::Validation(msg)) => assert_eq!(msg, "Passkeys do not match"),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(vault.list_records(id).unwrap().is_empty());
    assert!(!dir.path().join("data.json").exists());
}

#[test]
fn lockout_blocks_then_expires() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings(&dir);
    settings.lockout_duration = Duration::from_secs(1);
    let (vault, _) = Vault::open(settings).unwrap();
    let id = vault.start_session().unwrap();

    for _ in 0..3 {
        let result = vault.authenticate(id, "admin", "wrong");
        assert!(matches!(result, Err(SealboxError::AuthenticationFailure)));
    }

    // Correct credentials are not even checked while locked
    let locked = vault.authenticate(id, "admin", "admin123");
    assert!(matches!(locked, Err(SealboxError::LockedOut { .. })));
    assert!(vault.login_status(id).unwrap().locked_for_secs.is_some());

    thread::sleep(Duration::from_millis(1100));

    vault.authenticate(id, "admin", "admin123").unwrap();
    let status = vault.login_status(id).unwrap();
    assert_eq!(status.username.as_deref(), Some("admin"));
    assert_eq!(status.failed_attempts, 0);
}

#[test]
fn idle_session_expires() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings(&dir);
    settings.session_timeout = Duration::from_secs(1);
    let (vault, _) = Vault::open(settings).unwrap();
    let id = logged_in(&vault, "admin", "admin123");

    thread::sleep(Duration::from_millis(1200));

    let result = vault.store_record(id, StoreRequest::text("late", "x", "k", "k"));
    assert!(matches!(result, Err(SealboxError::SessionExpired)));
    assert!(!vault.is_authenticated(id).unwrap());

    let again = vault.list_records(id);
    assert!(matches!(again, Err(SealboxError::NotAuthenticated)));
}

#[test]
fn users_only_see_their_own_records() {
    let dir = TempDir::new().unwrap();
    let (vault, _) = Vault::open(settings(&dir)).unwrap();
    let admin = logged_in(&vault, "admin", "admin123");
    let user1 = logged_in(&vault, "user1", "password1");

    vault
        .store_record(admin, StoreRequest::text("shared", "admin data", "k1", "k1"))
        .unwrap();
    vault
        .store_record(user1, StoreRequest::text("shared", "user data", "k2", "k2"))
        .unwrap();

    let admin_view = vault.retrieve_record(admin, "shared", "k1").unwrap();
    let user_view = vault.retrieve_record(user1, "shared", "k2").unwrap();
    assert_eq!(admin_view.as_text().unwrap(), "admin data");
    assert_eq!(user_view.as_text().unwrap(), "user data");

    assert!(vault.delete_record(user1, "shared").unwrap());
    assert!(vault.list_records(user1).unwrap().is_empty());
    assert_eq!(vault.list_records(admin).unwrap().len(), 1);
}

#[test]
fn backups_rotate_and_keep_newest() {
    let dir = TempDir::new().unwrap();
    let (vault, _) = Vault::open(settings(&dir)).unwrap();
    let id = logged_in(&vault, "admin", "admin123");

    for i in 0..7 {
        let label = format!("note{}", i);
        vault
            .store_record(id, StoreRequest::text(label, "body", "k", "k"))
            .unwrap();
    }

    let backups = vault.list_backups().unwrap();
    assert_eq!(backups.len(), 5);
    for pair in backups.windows(2) {
        assert!(
            (pair[0].created_at, pair[0].sequence) > (pair[1].created_at, pair[1].sequence)
        );
    }

    let newest = vault.validate_backup("latest").unwrap();
    assert_eq!(newest.record_count, 6);
}

#[test]
fn parallel_sessions_save_without_interleaving() {
    const THREADS: usize = 6;
    const PER_THREAD: usize = 8;

    let dir = TempDir::new().unwrap();
    let (vault, _) = Vault::open(settings(&dir)).unwrap();

    thread::scope(|scope| {
        for t in 0..THREADS {
            let vault = &vault;
            scope.spawn(move || {
                let (user, password) = if t % 2 == 0 {
                    ("admin", "admin123")
                } else {
                    ("user1", "password1")
                };
                let id = logged_in(vault, user, password);
                for i in 0..PER_THREAD {
                    let label = format!("t{}-{}", t, i);
                    vault
                        .store_record(id, StoreRequest::text(label, "body", "k", "k"))
                        .unwrap();
                }
            });
        }
    });

    let backups = vault.list_backups().unwrap();
    assert_eq!(backups.len(), vault.settings().backup_retention);
    let mut names: Vec<&str> = backups.iter().map(|b| b.filename.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), backups.len());
    assert!(!dir.path().join("data.json.tmp").exists());

    drop(vault);
    let (reopened, report) = Vault::open(settings(&dir)).unwrap();
    assert_eq!(report.status, LoadStatus::Loaded);
    assert!(report.warning.is_none());
    assert_eq!(report.record_count, THREADS * PER_THREAD);

    let newest = reopened.validate_backup("latest").unwrap();
    assert_eq!(newest.record_count, THREADS * PER_THREAD - 1);
}

#[test]
fn corrupt_data_file_recovers_from_backup() {
    let dir = TempDir::new().unwrap();
    {
        let (vault, _) = Vault::open(settings(&dir)).unwrap();
        let id = logged_in(&vault, "admin", "admin123");
        vault
            .store_record(id, StoreRequest::text("first", "a", "k", "k"))
            .unwrap();
        vault
            .store_record(id, StoreRequest::text("second", "b", "k", "k"))
            .unwrap();
    }

    fs::write(dir.path().join("data.json"), "{ this is not json").unwrap();

    let (vault, report) = Vault::open(settings(&dir)).unwrap();
    assert!(matches!(report.status, LoadStatus::Recovered { .. }));
    assert!(matches!(
        report.warning,
        Some(SealboxError::CorruptStore { .. })
    ));
    assert_eq!(report.record_count, 1);

    let id = logged_in(&vault, "admin", "admin123");
    let labels: Vec<String> = vault
        .list_records(id)
        .unwrap()
        .into_iter()
        .map(|r| r.label)
        .collect();
    assert_eq!(labels, vec!["first".to_string()]);
}

#[test]
fn unrecoverable_store_starts_empty() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("data.json"), "garbage").unwrap();

    let (vault, report) = Vault::open(settings(&dir)).unwrap();
    assert_eq!(report.status, LoadStatus::Unrecoverable);
    assert_eq!(report.record_count, 0);

    let id = logged_in(&vault, "admin", "admin123");
    assert!(vault.list_records(id).unwrap().is_empty());
}

#[test]
fn file_record_with_preview() {
    let dir = TempDir::new().unwrap();
    let (vault, _) = Vault::open(settings(&dir)).unwrap();
    let id = logged_in(&vault, "admin", "admin123");

    let request = StoreRequest::file(
        "readme",
        "README.txt",
        Some("text/plain".to_string()),
        b"line one\nline two\n".to_vec(),
        "pk",
        "pk",
    );
    let summary = vault.store_record(id, request).unwrap();
    assert_eq!(summary.kind, RecordKind::File);
    let meta = summary.file_meta.unwrap();
    assert_eq!(meta.original_name, "README.txt");
    assert_eq!(meta.mime_type, "text/plain");

    let payload = vault.retrieve_record(id, "readme", "pk").unwrap();
    assert!(payload.is_previewable());
    assert_eq!(payload.text_preview(8).unwrap(), "line one...");
    assert_eq!(payload.bytes, b"line one\nline two\n");
}

#[test]
fn oversized_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings(&dir);
    settings.max_file_size = 16;
    let (vault, _) = Vault::open(settings).unwrap();
    let id = logged_in(&vault, "admin", "admin123");

    let request = StoreRequest::file("big", "big.bin", None, vec![0u8; 17], "pk", "pk");
    let result = vault.store_record(id, request);
    assert!(matches!(result, Err(SealboxError::Validation(_))));
}

#[test]
fn records_survive_reopen_but_need_the_original_session() {
    let dir = TempDir::new().unwrap();
    {
        let (vault, _) = Vault::open(settings(&dir)).unwrap();
        let id = logged_in(&vault, "admin", "admin123");
        vault
            .store_record(id, StoreRequest::text("note1", "hello", "abc123", "abc123"))
            .unwrap();
    }

    let (vault, report) = Vault::open(settings(&dir)).unwrap();
    assert_eq!(report.status, LoadStatus::Loaded);
    assert_eq!(report.record_count, 1);

    let id = logged_in(&vault, "admin", "admin123");
    assert_eq!(vault.list_records(id).unwrap().len(), 1);

    let result = vault.retrieve_record(id, "note1", "abc123");
    assert!(matches!(result, Err(SealboxError::Decryption(_))));
}

#[test]
fn change_password_requires_fresh_login() {
    let dir = TempDir::new().unwrap();
    let (vault, _) = Vault::open(settings(&dir)).unwrap();
    let id = logged_in(&vault, "user1", "password1");

    vault
        .change_password(id, "password1", "newpass", "newpass")
        .unwrap();
    assert!(!vault.is_authenticated(id).unwrap());

    let old = vault.authenticate(id, "user1", "password1");
    assert!(matches!(old, Err(SealboxError::AuthenticationFailure)));
    vault.authenticate(id, "user1", "newpass").unwrap();
}
