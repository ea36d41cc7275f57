// Durable bearer-token storage.
//
// The OS keyring holds the token (service "bookdesk", entry
// "<profile>/token"). When the keyring is unavailable the token goes to a
// 0600 file under the data directory. `BOOKDESK_TOKEN` overrides both.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use bookdesk_core::{CoreError, TokenStore};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

/// Environment variable that supplies a token without touching storage.
pub const TOKEN_ENV: &str = "BOOKDESK_TOKEN";

const KEYRING_SERVICE: &str = "bookdesk";

/// Token file for `profile` under the data directory.
pub fn token_path(profile: &str) -> PathBuf {
    let safe: String = profile
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    crate::data_dir().join("tokens").join(format!("{safe}.token"))
}

fn storage_error(action: &str, e: impl std::fmt::Display) -> CoreError {
    CoreError::Config {
        message: format!("failed to {action} token: {e}"),
    }
}

/// Per-profile [`TokenStore`] backed by the keyring with a file fallback.
pub struct KeyringTokenStore {
    profile: String,
    file: PathBuf,
    use_keyring: bool,
    env_token: Option<SecretString>,
}

impl KeyringTokenStore {
    /// Keyring first, file fallback, `BOOKDESK_TOKEN` override.
    pub fn new(profile: &str) -> Self {
        Self {
            profile: profile.to_owned(),
            file: token_path(profile),
            use_keyring: true,
            env_token: std::env::var(TOKEN_ENV)
                .ok()
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
        }
    }

    /// File storage only, at `path`, with no environment override.
    pub fn file_only(profile: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            profile: profile.to_owned(),
            file: path.into(),
            use_keyring: false,
            env_token: None,
        }
    }

    /// Use `token` instead of anything stored.
    pub fn with_override(mut self, token: Option<SecretString>) -> Self {
        self.env_token = token;
        self
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    fn entry(&self) -> Option<keyring::Entry> {
        if !self.use_keyring {
            return None;
        }
        match keyring::Entry::new(KEYRING_SERVICE, &format!("{}/token", self.profile)) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(profile = %self.profile, error = %e, "keyring unavailable");
                None
            }
        }
    }

    fn read_file(&self) -> Result<Option<SecretString>, CoreError> {
        match std::fs::read_to_string(&self.file) {
            Ok(text) => Ok(Some(text.trim().to_owned())
                .filter(|t| !t.is_empty())
                .map(SecretString::from)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", e)),
        }
    }

    fn write_file(&self, token: &SecretString) -> Result<(), CoreError> {
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| storage_error("store", e))?;
        }
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt as _;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.file)
            .map_err(|e| storage_error("store", e))?;
        file.write_all(token.expose_secret().as_bytes())
            .map_err(|e| storage_error("store", e))
    }

    fn remove_file(&self) -> Result<(), CoreError> {
        match std::fs::remove_file(&self.file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", e)),
        }
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<SecretString>, CoreError> {
        if let Some(token) = &self.env_token {
            return Ok(Some(token.clone()));
        }
        if let Some(entry) = self.entry() {
            match entry.get_password() {
                Ok(token) if !token.is_empty() => return Ok(Some(SecretString::from(token))),
                Ok(_) | Err(keyring::Error::NoEntry) => {}
                Err(e) => debug!(profile = %self.profile, error = %e, "keyring read failed"),
            }
        }
        self.read_file()
    }

    fn save(&self, token: &SecretString) -> Result<(), CoreError> {
        if let Some(entry) = self.entry() {
            match entry.set_password(token.expose_secret()) {
                // Drop any fallback copy.
                Ok(()) => return self.remove_file(),
                Err(e) => {
                    warn!(profile = %self.profile, error = %e, "keyring unavailable, storing token in file");
                }
            }
        }
        self.write_file(token)
    }

    fn clear(&self) -> Result<(), CoreError> {
        if let Some(entry) = self.entry() {
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => debug!(profile = %self.profile, error = %e, "keyring delete failed"),
            }
        }
        self.remove_file()
    }
}

impl std::fmt::Debug for KeyringTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringTokenStore")
            .field("profile", &self.profile)
            .field("file", &self.file)
            .field("use_keyring", &self.use_keyring)
            .field("env_override", &self.env_token.is_some())
            .finish()
    }
}
