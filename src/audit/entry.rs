//! Audit entry data structures
//!
//! Defines the structure of audit log entries including operation types,
//! entity types, and the entry format itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of events that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Successful login
    Login,
    /// Wrong username or password
    LoginFailed,
    /// Failure threshold reached, or attempt rejected during lockout
    LockedOut,
    Logout,
    /// Idle session logged out
    SessionExpired,
    /// Record stored
    Create,
    /// Record decrypted
    Access,
    /// Record access refused (wrong passkey or undecryptable)
    AccessDenied,
    /// Record deleted
    Delete,
    PasswordChange,
    /// Backup restored over the data file
    Restore,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Login => write!(f, "LOGIN"),
            Operation::LoginFailed => write!(f, "LOGIN_FAILED"),
            Operation::LockedOut => write!(f, "LOCKED_OUT"),
            Operation::Logout => write!(f, "LOGOUT"),
            Operation::SessionExpired => write!(f, "SESSION_EXPIRED"),
            Operation::Create => write!(f, "CREATE"),
            Operation::Access => write!(f, "ACCESS"),
            Operation::AccessDenied => write!(f, "ACCESS_DENIED"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::PasswordChange => write!(f, "PASSWORD_CHANGE"),
            Operation::Restore => write!(f, "RESTORE"),
        }
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    User,
    Record,
    Backup,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::User => write!(f, "User"),
            EntityType::Record => write!(f, "Record"),
            EntityType::Backup => write!(f, "Backup"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the event occurred (UTC)
    pub timestamp: DateTime<Utc>,

    /// What happened
    pub operation: Operation,

    /// Type of entity affected
    pub entity_type: EntityType,

    /// Username, record label or backup file name
    pub entity_id: String,

    /// Owner of a record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Free-form context, never secret material
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditEntry {
    pub fn new(operation: Operation, entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id: entity_id.into(),
            owner: None,
            detail: None,
        }
    }

    /// An event about a user account or session
    pub fn user(operation: Operation, username: impl Into<String>) -> Self {
        Self::new(operation, EntityType::User, username)
    }

    /// An event about one of `owner`'s records
    pub fn record(operation: Operation, owner: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(operation, EntityType::Record, label).with_owner(owner)
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(owner) = &self.owner {
            output.push_str(&format!(" (owner: {})", owner));
        }

        if let Some(detail) = &self.detail {
            output.push_str(&format!("\n  {}", detail));
        }

        output
    }
}
