//! Audit logging system for Sealbox
//!
//! Records security-relevant events (logins, lockouts, record access and
//! changes, password changes, restores) in an append-only audit log.
//!
//! # Architecture
//!
//! - `AuditEntry`: a single event with timestamp, operation, entity and an
//!   optional owner and detail. Entries never contain secrets.
//! - `AuditLogger`: appends entries to a line-delimited JSON file (JSONL) and
//!   reads them back.
//!
//! # Example
//!
//! ```rust,ignore
//! use sealbox::audit::{AuditEntry, AuditLogger, Operation};
//!
//! let logger = AuditLogger::new(audit_log_path);
//! logger.log(&AuditEntry::record(Operation::Create, "admin", "note1"))?;
//! for entry in logger.read_recent(10)? {
//!     println!("{}", entry.format_human_readable());
//! }
//! ```

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
