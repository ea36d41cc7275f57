// ── Core error types ──
//
// Interaction-scoped errors from bookdesk-core. Consumers never match on
// HTTP plumbing directly; `From<bookdesk_api::Error>` folds transport
// failures into the categories the console reacts to.

use indexmap::IndexMap;
use thiserror::Error;

/// Field name to message, in form order.
pub type FieldErrors = IndexMap<String, String>;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Before the request ───────────────────────────────────────────
    /// Field-scoped validation failures. Never sent to the server.
    #[error("Validation failed: {}", summarize(.errors))]
    Validation { errors: FieldErrors },

    #[error("An upload is still in progress")]
    UploadInProgress,

    // ── Server answers ───────────────────────────────────────────────
    /// 401. The session has already been cleared.
    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Any other non-2xx. `message` is the server's own text, if it sent one.
    #[error("API error{}: {}", status_suffix(.status), .message.as_deref().unwrap_or("request failed"))]
    Api {
        status: Option<u16>,
        message: Option<String>,
    },

    // ── Never reached the server ─────────────────────────────────────
    #[error("Cannot reach API: {reason}")]
    Transport { reason: String, timeout: bool },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, msg)| format!("{field}: {msg}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl CoreError {
    /// Single-field validation error.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_owned(), message.into());
        Self::Validation { errors }
    }

    /// Text for a transient notification: the server's message when it sent
    /// one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api {
                message: Some(msg), ..
            } => msg.clone(),
            Self::NotFound { what } if !what.is_empty() => what.clone(),
            Self::UploadInProgress => self.to_string(),
            _ => fallback.to_owned(),
        }
    }

    /// Field errors, when this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<bookdesk_api::Error> for CoreError {
    fn from(err: bookdesk_api::Error) -> Self {
        use bookdesk_api::Error as Api;

        let server = err.server_message();
        match err {
            Api::Unauthorized { .. } => CoreError::Unauthorized,
            Api::Http { status: 404, .. } => CoreError::NotFound {
                what: server.unwrap_or_default(),
            },
            Api::Http { status, .. } => CoreError::Api {
                status: Some(status),
                message: server,
            },
            Api::Transport(ref e) => CoreError::Transport {
                reason: e.to_string(),
                timeout: e.is_timeout(),
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(msg) => CoreError::Config { message: msg },
            Api::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Unexpected response: {message}"))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins_over_fallback() {
        let err = CoreError::from(bookdesk_api::Error::Http {
            status: 422,
            body: r#"{"error":"Slug already exists"}"#.into(),
        });
        assert_eq!(err.user_message("Action failed"), "Slug already exists");
    }

    #[test]
    fn fallback_when_server_is_silent() {
        let err = CoreError::from(bookdesk_api::Error::Http {
            status: 500,
            body: "oops".into(),
        });
        assert_eq!(err.user_message("Delete failed"), "Delete failed");
        assert_eq!(err.to_string(), "API error (500): request failed");
    }

    #[test]
    fn unauthorized_and_not_found_are_distinct() {
        let unauthorized = CoreError::from(bookdesk_api::Error::Unauthorized {
            path: "/api/admin/books".into(),
            body: String::new(),
        });
        assert!(matches!(unauthorized, CoreError::Unauthorized));

        let missing = CoreError::from(bookdesk_api::Error::Http {
            status: 404,
            body: String::new(),
        });
        assert!(matches!(missing, CoreError::NotFound { .. }));
    }

    #[test]
    fn validation_display_lists_fields() {
        let mut errors = FieldErrors::new();
        errors.insert("name".into(), "Name is required".into());
        errors.insert("email".into(), "Invalid email".into());
        let err = CoreError::Validation { errors };
        assert_eq!(
            err.to_string(),
            "Validation failed: name: Name is required; email: Invalid email"
        );
    }
}
