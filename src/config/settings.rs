//! Runtime settings for Sealbox
//!
//! Settings come from environment-style keys. `Settings::from_env` reads the
//! process environment; `Settings::from_lookup` accepts any key lookup so tests
//! and embedding callers can supply their own values.
//!
//! | Key                 | Default                     |
//! |---------------------|-----------------------------|
//! | `DATA_FILE`         | `encrypted_data.json`       |
//! | `MAX_FILE_SIZE`     | 200 MiB                     |
//! | `SESSION_TIMEOUT`   | 1800 seconds                |
//! | `LOCKOUT_DURATION`  | 30 seconds                  |
//! | `LOCKOUT_THRESHOLD` | 3 failed attempts           |
//! | `BACKUP_RETENTION`  | 5 backups                   |
//! | `AUDIT_LOG`         | `<DATA_FILE>.audit.log`     |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::SealboxPaths;
use crate::error::{SealboxError, SealboxResult};

pub const DEFAULT_DATA_FILE: &str = "encrypted_data.json";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 200 * 1024 * 1024;
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 30 * 60;
pub const DEFAULT_LOCKOUT_DURATION_SECS: u64 = 30;
pub const DEFAULT_LOCKOUT_THRESHOLD: u32 = 3;
pub const DEFAULT_BACKUP_RETENTION: usize = 5;

/// Value of `AUDIT_LOG` that turns the audit trail off
/// Upper bound for `SESSION_TIMEOUT` and `LOCKOUT_DURATION` (one year)
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

pub const AUDIT_LOG_DISABLED: &str = "off";

/// Settings for a Sealbox vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Primary JSON store file
    pub data_file: PathBuf,

    /// Largest accepted file payload in bytes
    pub max_file_size: u64,

    /// Idle time after which an authenticated session is logged out
    #[serde(with = "duration_secs")]
    pub session_timeout: Duration,

    /// Cooldown after the failure threshold is reached
    #[serde(with = "duration_secs")]
    pub lockout_duration: Duration,

    /// Consecutive failures that trigger a lockout
    pub lockout_threshold: u32,

    /// Number of timestamped backups kept next to the data file
    pub backup_retention: usize,

    /// Audit trail location; `None` disables auditing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_log: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let data_file = PathBuf::from(DEFAULT_DATA_FILE);
        let audit_log = Some(SealboxPaths::new(data_file.clone()).audit_log());
        Self {
            data_file,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            session_timeout: Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS),
            lockout_duration: Duration::from_secs(DEFAULT_LOCKOUT_DURATION_SECS),
            lockout_threshold: DEFAULT_LOCKOUT_THRESHOLD,
            backup_retention: DEFAULT_BACKUP_RETENTION,
            audit_log,
        }
    }
}

impl Settings {
    /// Settings rooted at a specific data file, everything else default
    pub fn with_data_file(data_file: impl Into<PathBuf>) -> Self {
        let data_file = data_file.into();
        let audit_log = Some(SealboxPaths::new(data_file.clone()).audit_log());
        Self {
            data_file,
            audit_log,
            ..Default::default()
        }
    }

    /// Load settings from the process environment
    pub fn from_env() -> SealboxResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> SealboxResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_file = lookup("DATA_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));

        let mut settings = Self::with_data_file(data_file);

        if let Some(v) = parse_key::<u64, _>(&lookup, "MAX_FILE_SIZE")? {
            settings.max_file_size = v;
        }
        if let Some(v) = parse_key::<u64, _>(&lookup, "SESSION_TIMEOUT")? {
            settings.session_timeout = Duration::from_secs(v);
        }
        if let Some(v) = parse_key::<u64, _>(&lookup, "LOCKOUT_DURATION")? {
            settings.lockout_duration = Duration::from_secs(v);
        }
        if let Some(v) = parse_key::<u32, _>(&lookup, "LOCKOUT_THRESHOLD")? {
            settings.lockout_threshold = v;
        }
        if let Some(v) = parse_key::<usize, _>(&lookup, "BACKUP_RETENTION")? {
            settings.backup_retention = v;
        }
        if let Some(v) = lookup("AUDIT_LOG") {
            settings.audit_log = parse_audit_log(&v);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the vault cannot operate with
    pub fn validate(&self) -> SealboxResult<()> {
        if self.data_file.as_os_str().is_empty() {
            return Err(SealboxError::Config("DATA_FILE cannot be empty".into()));
        }
        if self.data_file.file_name().is_none() {
            return Err(SealboxError::Config(format!(
                "DATA_FILE must name a file: {}",
                self.data_file.display()
            )));
        }
        if self.max_file_size == 0 {
            return Err(SealboxError::Config(
                "MAX_FILE_SIZE must be greater than zero".into(),
            ));
        }
        check_duration("SESSION_TIMEOUT", self.session_timeout)?;
        check_duration("LOCKOUT_DURATION", self.lockout_duration)?;
        if self.lockout_threshold == 0 {
            return Err(SealboxError::Config(
                "LOCKOUT_THRESHOLD must be at least 1".into(),
            ));
        }
        if self.backup_retention == 0 {
            return Err(SealboxError::Config(
                "BACKUP_RETENTION must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Paths derived from the data file
    pub fn paths(&self) -> SealboxPaths {
        SealboxPaths::new(self.data_file.clone())
    }
}

/// Interpret an `AUDIT_LOG` value
pub fn parse_audit_log(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(AUDIT_LOG_DISABLED) {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn check_duration(key: &str, value: Duration) -> SealboxResult<()> {
    if value.as_secs() > MAX_DURATION_SECS {
        return Err(SealboxError::Config(format!(
            "{} must be at most {} seconds",
            key, MAX_DURATION_SECS
        )));
    }
    Ok(())
}

fn parse_key<T, F>(lookup: &F, key: &str) -> SealboxResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| SealboxError::Config(format!("Invalid {} '{}': {}", key, raw, e))),
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.data_file, PathBuf::from("encrypted_data.json"));
        assert_eq!(settings.max_file_size, 200 * 1024 * 1024);
        assert_eq!(settings.session_timeout, Duration::from_secs(1800));
        assert_eq!(settings.lockout_duration, Duration::from_secs(30));
        assert_eq!(settings.lockout_threshold, 3);
        assert_eq!(settings.backup_retention, 5);
        assert_eq!(
            settings.audit_log,
            Some(PathBuf::from("encrypted_data.json.audit.log"))
        );
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.data_file, PathBuf::from(DEFAULT_DATA_FILE));
        assert_eq!(settings.lockout_threshold, DEFAULT_LOCKOUT_THRESHOLD);
    }

    #[test]
    fn test_lookup_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("DATA_FILE", "/tmp/vault/store.json"),
            ("MAX_FILE_SIZE", "1024"),
            ("SESSION_TIMEOUT", "60"),
            ("LOCKOUT_DURATION", "5"),
            ("BACKUP_RETENTION", "2"),
        ]))
        .unwrap();

        assert_eq!(settings.data_file, PathBuf::from("/tmp/vault/store.json"));
        assert_eq!(settings.max_file_size, 1024);
        assert_eq!(settings.session_timeout, Duration::from_secs(60));
        assert_eq!(settings.lockout_duration, Duration::from_secs(5));
        assert_eq!(settings.backup_retention, 2);
        assert_eq!(
            settings.audit_log,
            Some(PathBuf::from("/tmp/vault/store.json.audit.log"))
        );
    }

    #[test]
    fn test_audit_log_can_be_disabled() {
        let settings = Settings::from_lookup(lookup_from(&[("AUDIT_LOG", "off")])).unwrap();
        assert!(settings.audit_log.is_none());
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = Settings::from_lookup(lookup_from(&[("MAX_FILE_SIZE", "lots")])).unwrap_err();
        assert!(matches!(err, SealboxError::Config(_)));
        assert!(err.to_string().contains("MAX_FILE_SIZE"));
    }

    #[test]
    fn test_huge_durations_rejected() {
        for key in ["LOCKOUT_DURATION", "SESSION_TIMEOUT"] {
            let err = Settings::from_lookup(lookup_from(&[(key, "10000000000000")])).unwrap_err();
            assert!(matches!(err, SealboxError::Config(_)));
            assert!(err.to_string().contains(key));
        }

        let limit = MAX_DURATION_SECS.to_string();
        let settings =
            Settings::from_lookup(lookup_from(&[("LOCKOUT_DURATION", limit.as_str())])).unwrap();
        assert_eq!(settings.lockout_duration.as_secs(), MAX_DURATION_SECS);
    }

    #[test]
    fn test_zero_retention_rejected() {
        let err = Settings::from_lookup(lookup_from(&[("BACKUP_RETENTION", "0")])).unwrap_err();
        assert!(matches!(err, SealboxError::Config(_)));
    }

    #[test]
    fn test_serde_round_trip() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let deserialized: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings.session_timeout, deserialized.session_timeout);
        assert_eq!(settings.data_file, deserialized.data_file);
    }
}
