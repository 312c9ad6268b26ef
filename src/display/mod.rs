//! Display formatting for terminal output
//!
//! Formats records, payloads, backups and settings as plain text tables and
//! detail views.

pub mod backup;
pub mod record;

pub use backup::{format_backup_list, format_restore_result, format_settings, format_validation};
pub use record::{format_file_size, format_payload, format_record_list};
