//! Backup CLI commands
//!
//! Implements CLI commands for backup management.

use clap::Subcommand;

use crate::display::{format_backup_list, format_restore_result, format_validation};
use crate::error::SealboxResult;
use crate::services::Vault;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// List all available backups
    List,

    /// Show information about a specific backup
    Info {
        /// Backup filename (use 'latest' for most recent)
        backup: String,
    },

    /// Restore from a backup
    Restore {
        /// Backup filename (use 'latest' for most recent)
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a backup command
pub fn handle_backup_command(vault: &Vault, cmd: BackupCommands) -> SealboxResult<()> {
    match cmd {
        BackupCommands::List => {
            let backups = vault.list_backups()?;
            if backups.is_empty() {
                println!("{}", format_backup_list(&backups));
            } else {
                print!("{}", format_backup_list(&backups));
                println!();
                println!("Total: {} backup(s)", backups.len());
            }
        }

        BackupCommands::Info { backup } => {
            let info = vault.persistence().backups().find(&backup)?;
            let validation = vault.validate_backup(&info.filename)?;
            print!("{}", format_validation(&info, &validation));
        }

        BackupCommands::Restore { backup, force } => {
            let info = vault.persistence().backups().find(&backup)?;
            let validation = vault.validate_backup(&info.filename)?;
            print!("{}", format_validation(&info, &validation));
            println!();

            if !force {
                println!("WARNING: This will replace the current data file!");
                println!("The current file is kept as a new backup.");
                println!("To proceed, run again with --force flag:");
                println!("  sealbox backup restore {} --force", backup);
                return Ok(());
            }

            let result = vault.restore_backup(&info.filename)?;
            print!("{}", format_restore_result(&result));
        }
    }

    Ok(())
}
