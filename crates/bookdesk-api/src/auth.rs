// Authentication endpoint and the session hook the client calls into.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::debug;

use crate::client::AdminClient;
use crate::error::Error;

/// Path of the login endpoint. A 401 from this path is a plain failed login
/// and never triggers the global logout.
pub const LOGIN_PATH: &str = "/api/admin/login";

/// Bridge between the HTTP client and whoever owns the session.
///
/// The client reads the bearer token before every request and reports
/// authorization failures back. Implementations must tolerate repeated
/// `unauthorized` calls; the client issues exactly one per failing response.
pub trait AuthHandler: Send + Sync {
    /// Bearer token to attach, if any.
    fn token(&self) -> Option<SecretString>;

    /// Called once for every 401 response whose path is not [`LOGIN_PATH`].
    fn unauthorized(&self);
}

/// Handler for clients that never carry a session (health checks, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct Anonymous;

impl AuthHandler for Anonymous {
    fn token(&self) -> Option<SecretString> {
        None
    }

    fn unauthorized(&self) {}
}

/// Successful login response: `{token, name, role}`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(deserialize_with = "secret")]
    pub token: SecretString,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

fn secret<'de, D: Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
    String::deserialize(d).map(SecretString::from)
}

impl AdminClient {
    /// Exchange email and password for a bearer token.
    ///
    /// The session is not touched here; the caller decides what to do with
    /// the returned token.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<LoginResponse, Error> {
        debug!(email, "logging in");
        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });
        self.post(LOGIN_PATH, &body).await
    }
}
