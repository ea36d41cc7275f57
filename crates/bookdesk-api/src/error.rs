use thiserror::Error;

/// Top-level error type for the `bookdesk-api` crate.
///
/// Every request either yields parsed JSON or one of these. `bookdesk-core`
/// maps them into its own interaction-scoped taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── HTTP ────────────────────────────────────────────────────────
    /// Non-2xx response. `body` is the raw response text.
    #[error("HTTP {status}: {}", preview(.body))]
    Http { status: u16, body: String },

    /// 401 from any endpoint. The session has already been cleared by the
    /// time the caller sees this (unless `path` is the login endpoint).
    #[error("Unauthorized request to {path}")]
    Unauthorized { path: String, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Failed to build the underlying HTTP client.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}

impl Error {
    /// HTTP status of the failing response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message supplied by the server in an `{"error": ...}` or
    /// `{"message": ...}` body.
    pub fn server_message(&self) -> Option<String> {
        let body = match self {
            Self::Http { body, .. } | Self::Unauthorized { body, .. } => body,
            _ => return None,
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        ["error", "message"]
            .iter()
            .find_map(|field| value.get(field).and_then(serde_json::Value::as_str))
            .filter(|msg| !msg.is_empty())
            .map(String::from)
    }

    /// Returns `true` for a 401 response.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` for a 404 response.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` when the server was never reached.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }

    /// Returns `true` when the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn server_message_prefers_error_field() {
        let err = Error::Http {
            status: 422,
            body: r#"{"error":"Slug already exists","message":"ignored"}"#.into(),
        };
        assert_eq!(err.server_message().as_deref(), Some("Slug already exists"));
    }

    #[test]
    fn server_message_falls_back_to_message_field() {
        let err = Error::Http {
            status: 500,
            body: r#"{"message":"boom"}"#.into(),
        };
        assert_eq!(err.server_message().as_deref(), Some("boom"));
    }

    #[test]
    fn server_message_absent_for_plain_text() {
        let err = Error::Http {
            status: 502,
            body: "Bad Gateway".into(),
        };
        assert!(err.server_message().is_none());
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn display_truncates_long_bodies() {
        let err = Error::Http {
            status: 500,
            body: "x".repeat(500),
        };
        let shown = err.to_string();
        assert!(shown.len() < 220, "{shown}");
    }
}
