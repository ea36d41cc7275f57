//! Shared helpers for command handlers.

use std::io::{self, BufRead, IsTerminal};
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;

use bookdesk_core::{Console, CoreError};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Fail early when there is no session to act with.
pub fn require_session(console: &Console, profile: &str) -> Result<(), CliError> {
    if console.is_authenticated() {
        Ok(())
    } else {
        Err(CliError::NotLoggedIn {
            profile: profile.into(),
        })
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, global: &GlobalOpts) -> Result<bool, CliError> {
    if global.yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.trim_end_matches('?').into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

pub fn prompt_err(e: dialoguer::Error) -> CliError {
    CliError::Prompt(e.to_string())
}

/// Read a secret: the first stdin line with `from_stdin`, else a hidden prompt.
pub fn read_secret(prompt: &str, from_stdin: bool) -> Result<SecretString, CliError> {
    let raw = if from_stdin {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_owned()
    } else {
        rpassword::prompt_password(prompt)?
    };
    Ok(SecretString::from(raw))
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Steady spinner on stderr; hidden when quiet or not on a terminal.
pub fn spinner(global: &GlobalOpts, message: impl Into<String>) -> ProgressBar {
    if global.quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Not-found error pointing at the resource's list command.
pub fn not_found(resource: bookdesk_core::Resource, identifier: &str) -> CliError {
    CliError::NotFound {
        resource_type: resource.singular().into(),
        identifier: identifier.into(),
        list_command: format!("{resource} list"),
    }
}

/// Parse a numeric record ID.
pub fn parse_id(resource: bookdesk_core::Resource, raw: &str) -> Result<u64, CliError> {
    raw.trim().parse().map_err(|_| CliError::Validation {
        field: "id".into(),
        reason: format!("{} IDs are numeric, got '{raw}'", resource.singular()),
    })
}

/// Error from a detail endpoint, with 404 pointing at the list command.
pub fn lookup_err(resource: bookdesk_core::Resource, identifier: &str, err: bookdesk_core::api::Error) -> CliError {
    match err.status() {
        Some(404) => not_found(resource, identifier),
        _ => CoreError::from(err).into(),
    }
}
