//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use bookdesk_config::ConfigError;
use bookdesk_core::{CoreError, FieldErrors};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the API at {url}")]
    #[diagnostic(
        code(bookdesk::connection_failed),
        help(
            "Check that the API is running and reachable.\n\
             Reason: {reason}\n\
             Try: bookdesk --api-url <URL> whoami"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(bookdesk::timeout),
        help("Increase the timeout with --timeout or check the API's responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Not logged in (profile '{profile}')")]
    #[diagnostic(
        code(bookdesk::not_logged_in),
        help(
            "Run: bookdesk login --profile {profile}\n\
             Or set BOOKDESK_TOKEN to an existing bearer token."
        )
    )]
    NotLoggedIn { profile: String },

    #[error("Session expired, please log in again")]
    #[diagnostic(code(bookdesk::session_expired), help("Run: bookdesk login"))]
    SessionExpired,

    #[error("Login failed: {message}")]
    #[diagnostic(code(bookdesk::login_failed), help("Check the email and password and try again."))]
    LoginFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(bookdesk::not_found),
        help("Run: bookdesk {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Not found: {message}")]
    #[diagnostic(code(bookdesk::not_found))]
    ApiNotFound { message: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(bookdesk::api_error))]
    ApiError { status: Option<u16>, message: String },

    #[error("An upload is still in progress")]
    #[diagnostic(code(bookdesk::upload_in_progress))]
    UploadInProgress,

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(bookdesk::validation))]
    Validation { field: String, reason: String },

    #[error("The form was rejected")]
    #[diagnostic(code(bookdesk::invalid_form), help("{details}"))]
    InvalidForm { details: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(bookdesk::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: bookdesk config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(bookdesk::config), help("Inspect it with: bookdesk config show"))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(bookdesk::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Prompt failed: {0}")]
    #[diagnostic(code(bookdesk::prompt))]
    Prompt(String),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(bookdesk::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Could not render YAML: {0}")]
    #[diagnostic(code(bookdesk::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(bookdesk::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotLoggedIn { .. } | Self::SessionExpired | Self::LoginFailed { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } | Self::ApiNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::InvalidForm { .. }
            | Self::ProfileNotFound { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Name the API a connection failure was against.
    pub fn with_api_url(self, api_url: &str) -> Self {
        match self {
            Self::ConnectionFailed { reason, .. } => Self::ConnectionFailed {
                url: api_url.to_owned(),
                reason,
            },
            other => other,
        }
    }
}

fn describe_fields(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { errors } => match errors.len() {
                1 => {
                    let (field, reason) = errors
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| (String::new(), String::new()));
                    CliError::Validation { field, reason }
                }
                _ => CliError::InvalidForm {
                    details: describe_fields(&errors),
                },
            },
            CoreError::UploadInProgress => CliError::UploadInProgress,
            CoreError::Unauthorized => CliError::SessionExpired,
            CoreError::NotFound { what } => CliError::ApiNotFound {
                message: if what.is_empty() {
                    "the API has no such record".into()
                } else {
                    what
                },
            },
            CoreError::Api { status, message } => CliError::ApiError {
                status,
                message: message.unwrap_or_else(|| "request failed".into()),
            },
            CoreError::Transport { timeout: true, .. } => CliError::Timeout,
            CoreError::Transport { reason, .. } => CliError::ConnectionFailed {
                url: String::new(),
                reason,
            },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { profile } => {
                let cfg = bookdesk_config::load_config_or_default();
                let available = cfg.profile_names().join(", ");
                CliError::ProfileNotFound {
                    name: profile,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available
                    },
                }
            }
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
