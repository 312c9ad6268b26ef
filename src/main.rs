use std::io;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sealbox::cli::{handle_audit_command, handle_backup_command, BackupCommands, Shell, TerminalSecrets};
use sealbox::display::format_settings;
use sealbox::{LoadStatus, Settings, Vault};

#[derive(Parser)]
#[command(
    name = "sealbox",
    version,
    about = "Passkey-gated encryption of text and files",
    long_about = "Sealbox encrypts text and files under a passkey for logged-in users \
                  and stores them in a single JSON file with rolling backups."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Settings overrides; each falls back to its environment variable
#[derive(Args)]
struct GlobalArgs {
    /// Primary JSON data file
    #[arg(long, env = "DATA_FILE", global = true)]
    data_file: Option<String>,

    /// Largest accepted file in bytes
    #[arg(long, env = "MAX_FILE_SIZE", global = true)]
    max_file_size: Option<String>,

    /// Idle seconds before a session is logged out
    #[arg(long, env = "SESSION_TIMEOUT", global = true)]
    session_timeout: Option<String>,

    /// Lockout length in seconds after too many failed logins
    #[arg(long, env = "LOCKOUT_DURATION", global = true)]
    lockout_duration: Option<String>,

    /// Failed logins that trigger a lockout
    #[arg(long, env = "LOCKOUT_THRESHOLD", global = true)]
    lockout_threshold: Option<String>,

    /// Number of backups to keep
    #[arg(long, env = "BACKUP_RETENTION", global = true)]
    backup_retention: Option<String>,

    /// Audit log path, or 'off'
    #[arg(long, env = "AUDIT_LOG", global = true)]
    audit_log: Option<String>,
}

impl GlobalArgs {
    fn lookup(&self, key: &str) -> Option<String> {
        let value = match key {
            "DATA_FILE" => &self.data_file,
            "MAX_FILE_SIZE" => &self.max_file_size,
            "SESSION_TIMEOUT" => &self.session_timeout,
            "LOCKOUT_DURATION" => &self.lockout_duration,
            "LOCKOUT_THRESHOLD" => &self.lockout_threshold,
            "BACKUP_RETENTION" => &self.backup_retention,
            "AUDIT_LOG" => &self.audit_log,
            _ => return None,
        };
        value.clone()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (default)
    Shell,

    /// Show effective settings
    Config,

    /// Backup management commands
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_lookup(|key| cli.global.lookup(key))?;

    if let Some(Commands::Config) = cli.command {
        println!("Sealbox Configuration");
        println!("=====================");
        print!("{}", format_settings(&settings));
        return Ok(());
    }

    let (vault, report) = Vault::open(settings)?;
    if let Some(warning) = &report.warning {
        eprintln!("Warning: {}", warning);
    }

    match cli.command {
        None | Some(Commands::Shell) => {
            if report.status == LoadStatus::Missing {
                println!("No data file yet, a new one will be created on first save.");
            }
            let stdin = io::stdin();
            let mut shell = Shell::new(&vault, stdin.lock(), io::stdout(), TerminalSecrets)?;
            shell.run()?;
        }
        Some(Commands::Backup(cmd)) => handle_backup_command(&vault, cmd)?,
        Some(Commands::Audit { limit }) => handle_audit_command(&vault, limit)?,
        Some(Commands::Config) => {}
    }

    Ok(())
}
