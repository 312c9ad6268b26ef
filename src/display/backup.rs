//! Backup and settings display formatting

use crate::backup::{BackupInfo, RestoreResult, ValidationResult};
use crate::config::Settings;

use super::record::format_file_size;

/// Format a list of backups, newest first
pub fn format_backup_list(backups: &[BackupInfo]) -> String {
    if backups.is_empty() {
        return "No backups found.".to_string();
    }

    let name_width = backups
        .iter()
        .map(|b| b.filename.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<19}  {:>10}\n",
        "Name",
        "Created",
        "Size",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<19}  {:->10}\n",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for backup in backups {
        output.push_str(&format!(
            "{:<name_width$}  {:<19}  {:>10}\n",
            backup.filename,
            backup.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            format_file_size(backup.size_bytes),
            name_width = name_width,
        ));
    }

    output
}

/// Format the result of validating a backup
pub fn format_validation(backup: &BackupInfo, validation: &ValidationResult) -> String {
    let mut output = String::new();
    output.push_str(&format!("Backup: {}\n", backup.filename));
    output.push_str(&format!("  Path:     {}\n", backup.path.display()));
    output.push_str(&format!(
        "  Created:  {}\n",
        validation.backup_date.format("%Y-%m-%d %H:%M:%S")
    ));
    output.push_str(&format!("  Size:     {}\n", format_file_size(backup.size_bytes)));
    output.push_str(&format!("  Users:    {}\n", validation.owner_count));
    output.push_str(&format!("  Records:  {}\n", validation.record_count));
    output.push_str("  Status:   Valid\n");
    output
}

/// Format the result of a restore
pub fn format_restore_result(result: &RestoreResult) -> String {
    let mut output = format!("{}\n", result.summary());
    if let Some(previous) = &result.previous_primary {
        output.push_str(&format!("Previous data kept as {}\n", previous));
    }
    output
}

/// Format effective settings
pub fn format_settings(settings: &Settings) -> String {
    let audit = settings
        .audit_log
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "off".to_string());

    let mut output = String::new();
    output.push_str(&format!("DATA_FILE          {}\n", settings.data_file.display()));
    output.push_str(&format!(
        "MAX_FILE_SIZE      {} ({})\n",
        settings.max_file_size,
        format_file_size(settings.max_file_size)
    ));
    output.push_str(&format!(
        "SESSION_TIMEOUT    {}s\n",
        settings.session_timeout.as_secs()
    ));
    output.push_str(&format!(
        "LOCKOUT_DURATION   {}s\n",
        settings.lockout_duration.as_secs()
    ));
    output.push_str(&format!("LOCKOUT_THRESHOLD  {}\n", settings.lockout_threshold));
    output.push_str(&format!("BACKUP_RETENTION   {}\n", settings.backup_retention));
    output.push_str(&format!("AUDIT_LOG          {}\n", audit));
    output
}
