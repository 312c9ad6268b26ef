//! Audit CLI command

use crate::services::Vault;
use crate::error::SealboxResult;

/// Print the most recent audit entries
pub fn handle_audit_command(vault: &Vault, limit: usize) -> SealboxResult<()> {
    let Some(logger) = vault.audit_log() else {
        println!("Audit logging is disabled (AUDIT_LOG=off).");
        return Ok(());
    };

    let entries = logger.read_recent(limit)?;
    if entries.is_empty() {
        println!("No audit entries in {}", logger.path().display());
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry.format_human_readable());
    }
    println!();
    println!(
        "Showing {} most recent entr{} from {}",
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" },
        logger.path().display()
    );
    Ok(())
}
