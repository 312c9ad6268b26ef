//! Interactive shell
//!
//! A line-oriented front end over one vault session. Passwords and passkeys
//! are read through a `SecretReader` so they never echo on a terminal.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::display::{format_payload, format_record_list};
use crate::error::{SealboxError, SealboxResult};
use crate::models::{SessionId, StoreRequest, StoreValidationError};
use crate::services::Vault;

const HELP: &str = "\
Commands:
  store-text                     Encrypt text typed at the prompt
  store-file <path>              Encrypt a file
  retrieve <label> [--out <path>]
                                 Decrypt a record (optionally save it to a file)
  list                           List your records
  delete <label>                 Delete a record
  passwd                         Change your password
  logout                         Log out
  help                           Show this help
  quit                           Exit";

/// Source of hidden input
pub trait SecretReader {
    fn read_secret(&mut self, prompt: &str) -> io::Result<String>;
}

/// Reads secrets from the terminal without echo
pub struct TerminalSecrets;

impl SecretReader for TerminalSecrets {
    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        rpassword::prompt_password(prompt)
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Interactive session bound to a vault
pub struct Shell<'a, R, W, S> {
    vault: &'a Vault,
    session: SessionId,
    input: R,
    out: W,
    secrets: S,
}

impl<'a, R, W, S> Shell<'a, R, W, S>
where
    R: BufRead,
    W: Write,
    S: SecretReader,
{
    /// Start a new vault session for this shell
    pub fn new(vault: &'a Vault, input: R, out: W, secrets: S) -> SealboxResult<Self> {
        let session = vault.start_session()?;
        Ok(Self {
            vault,
            session,
            input,
            out,
            secrets,
        })
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Run until `quit` or end of input, then end the session
    pub fn run(&mut self) -> SealboxResult<()> {
        writeln!(self.out, "Sealbox secure data vault. Type 'quit' to exit.")?;

        let result = self.run_loop();
        let ended = self.vault.end_session(self.session);
        result.and(ended)
    }

    fn run_loop(&mut self) -> SealboxResult<()> {
        loop {
            let flow = if self.vault.is_authenticated(self.session)? {
                self.command_prompt()?
            } else {
                self.login_prompt()?
            };
            if let Flow::Quit = flow {
                return Ok(());
            }
        }
    }

    fn read_line(&mut self, prompt: &str) -> SealboxResult<Option<String>> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;

        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn read_secret(&mut self, prompt: &str) -> SealboxResult<String> {
        self.out.flush()?;
        self.secrets
            .read_secret(prompt)
            .map_err(|e| SealboxError::Io(format!("Failed to read hidden input: {}", e)))
    }

    fn login_prompt(&mut self) -> SealboxResult<Flow> {
        let Some(username) = self.read_line("Username: ")? else {
            return Ok(Flow::Quit);
        };
        let username = username.trim().to_string();
        match username.as_str() {
            "" => return Ok(Flow::Continue),
            "quit" | "exit" => return Ok(Flow::Quit),
            _ => {}
        }

        let password = self.read_secret("Password: ")?;

        match self.vault.authenticate(self.session, &username, &password) {
            Ok(()) => {
                writeln!(self.out, "Welcome, {}! Type 'help' for commands.", username)?;
            }
            Err(SealboxError::AuthenticationFailure) => {
                let status = self.vault.login_status(self.session)?;
                match status.locked_for_secs {
                    Some(secs) => writeln!(
                        self.out,
                        "Too many failed attempts. Please wait {} seconds before trying again",
                        secs
                    )?,
                    None => writeln!(
                        self.out,
                        "Invalid credentials. {} attempt(s) remaining.",
                        status.attempts_remaining
                    )?,
                }
            }
            Err(e) => writeln!(self.out, "{}", e)?,
        }

        Ok(Flow::Continue)
    }

    fn command_prompt(&mut self) -> SealboxResult<Flow> {
        let Some(line) = self.read_line("sealbox> ")? else {
            return Ok(Flow::Quit);
        };

        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let result = match command {
            "store-text" => self.store_text(),
            "store-file" => self.store_file(rest),
            "retrieve" => self.retrieve(rest),
            "list" => self.list(),
            "delete" => self.delete(rest),
            "passwd" => self.change_password(),
            "logout" => {
                self.vault.logout(self.session)?;
                writeln!(self.out, "Logged out.")?;
                Ok(())
            }
            "help" => {
                writeln!(self.out, "{}", HELP)?;
                Ok(())
            }
            "quit" | "exit" => return Ok(Flow::Quit),
            other => {
                writeln!(self.out, "Unknown command '{}'. Type 'help' for commands.", other)?;
                Ok(())
            }
        };

        if let Err(e) = result {
            writeln!(self.out, "Error: {}", e)?;
        }

        Ok(Flow::Continue)
    }

    fn read_passkey_pair(&mut self) -> SealboxResult<(String, String)> {
        let passkey = self.read_secret("Passkey: ")?;
        let confirm = self.read_secret("Confirm passkey: ")?;
        Ok((passkey, confirm))
    }

    fn store_text(&mut self) -> SealboxResult<()> {
        self.vault.check_session(self.session)?;

        let label = self.read_line("Label: ")?.unwrap_or_default();
        writeln!(self.out, "Enter text, finish with a line containing only '.':")?;

        let mut lines = Vec::new();
        while let Some(line) = self.read_line("")? {
            if line == "." {
                break;
            }
            lines.push(line);
        }

        let (passkey, confirm) = self.read_passkey_pair()?;
        let request = StoreRequest::text(label, lines.join("\n"), passkey, confirm);
        let summary = self.vault.store_record(self.session, request)?;

        writeln!(self.out, "Data '{}' encrypted and saved.", summary.label)?;
        Ok(())
    }

    fn store_file(&mut self, path: &str) -> SealboxResult<()> {
        self.vault.check_session(self.session)?;

        if path.is_empty() {
            return Err(SealboxError::validation("Usage: store-file <path>"));
        }
        let path = Path::new(path);

        let size = fs::metadata(path)
            .map_err(|e| SealboxError::Io(format!("Cannot read {}: {}", path.display(), e)))?
            .len();
        let max = self.vault.settings().max_file_size;
        if size > max {
            let message = StoreValidationError::FileTooLarge { size, max }.to_string();
            return Err(SealboxError::Validation(message));
        }

        let bytes = fs::read(path)
            .map_err(|e| SealboxError::Io(format!("Cannot read {}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let label = self
            .read_line(&format!("Label [{}]: ", name))?
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| name.clone());

        let (passkey, confirm) = self.read_passkey_pair()?;
        let request = StoreRequest::file(label, name, guess_mime(path), bytes, passkey, confirm);
        let summary = self.vault.store_record(self.session, request)?;

        writeln!(self.out, "File '{}' encrypted and saved.", summary.label)?;
        Ok(())
    }

    fn retrieve(&mut self, args: &str) -> SealboxResult<()> {
        self.vault.check_session(self.session)?;

        let (label, out_path) = split_out_flag(args);
        if label.is_empty() {
            return Err(SealboxError::validation(
                "Usage: retrieve <label> [--out <path>]",
            ));
        }

        let passkey = self.read_secret("Passkey: ")?;
        let payload = self.vault.retrieve_record(self.session, label, &passkey)?;

        match out_path {
            Some(path) if !path.is_empty() => {
                fs::write(path, &payload.bytes).map_err(|e| {
                    SealboxError::Io(format!("Failed to write {}: {}", path, e))
                })?;
                writeln!(self.out, "Decrypted '{}' written to {}", label, path)?;
            }
            Some(_) => {
                return Err(SealboxError::validation("--out requires a path"));
            }
            None => write!(self.out, "{}", format_payload(&payload))?,
        }
        Ok(())
    }

    fn list(&mut self) -> SealboxResult<()> {
        let records = self.vault.list_records(self.session)?;
        writeln!(self.out, "{}", format_record_list(&records).trim_end())?;
        Ok(())
    }

    fn delete(&mut self, label: &str) -> SealboxResult<()> {
        self.vault.check_session(self.session)?;

        if label.is_empty() {
            return Err(SealboxError::validation("Usage: delete <label>"));
        }

        let answer = self
            .read_line(&format!("Delete '{}'? [y/N]: ", label))?
            .unwrap_or_default();
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            writeln!(self.out, "Cancelled.")?;
            return Ok(());
        }

        if self.vault.delete_record(self.session, label)? {
            writeln!(self.out, "Deleted '{}'.", label)?;
        } else {
            writeln!(self.out, "No record named '{}'.", label)?;
        }
        Ok(())
    }

    fn change_password(&mut self) -> SealboxResult<()> {
        self.vault.check_session(self.session)?;

        let current = self.read_secret("Current password: ")?;
        let new = self.read_secret("New password: ")?;
        let confirm = self.read_secret("Confirm new password: ")?;

        self.vault
            .change_password(self.session, &current, &new, &confirm)?;
        writeln!(self.out, "Password changed. Please log in again.")?;
        Ok(())
    }
}

/// MIME type from a file extension
/// Split `retrieve` arguments at a standalone `--out` token
fn split_out_flag(args: &str) -> (&str, Option<&str>) {
    const FLAG: &str = "--out";
    let standalone = |idx: usize| {
        let before = args[..idx].chars().next_back();
        let after = args[idx + FLAG.len()..].chars().next();
        before.map_or(true, char::is_whitespace) && after.map_or(true, char::is_whitespace)
    };

    match args.match_indices(FLAG).map(|(idx, _)| idx).find(|&idx| standalone(idx)) {
        Some(idx) => (args[..idx].trim(), Some(args[idx + FLAG.len()..].trim())),
        None => (args.trim(), None),
    }
}

fn guess_mime(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    let mime = match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime.to_string())
}
