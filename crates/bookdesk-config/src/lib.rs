//! Shared configuration for the bookdesk console.
//!
//! TOML profiles, figment layering (defaults, file, `BOOKDESK_` env),
//! durable token storage, and translation to
//! `bookdesk_core::ConsoleConfig`. The CLI adds flag-aware wrappers on top.

mod token;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bookdesk_core::api::TlsMode;
use bookdesk_core::{ConsoleConfig, DEFAULT_API_URL, DEFAULT_PAGE_SIZE};

pub use token::{KeyringTokenStore, TOKEN_ENV, token_path};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named API profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile in effect: the override, else `default_profile`,
    /// else `"default"`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
            .to_owned()
    }

    /// Sorted profile names.
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Make `name` the default. It must exist.
    pub fn set_default_profile(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.profiles.contains_key(name) {
            return Err(ConfigError::UnknownProfile {
                profile: name.into(),
            });
        }
        self.default_profile = Some(name.into());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Rows per list page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            page_size: default_page_size(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// A named API profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Admin API base URL, path prefix included.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Email used to log in last time; offered as the prompt default.
    pub email: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override the insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override page size.
    pub page_size: Option<u32>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            email: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            page_size: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "bookdesk", "bookdesk")
}

fn home_fallback(parts: &[&str]) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.extend(parts);
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".config", "bookdesk", "config.toml"]),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for state that is not configuration (token files).
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".local", "share", "bookdesk"]),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

// ── Loading & saving ────────────────────────────────────────────────

/// Load the full Config from the canonical file and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file. A missing file is not an error.
///
/// Environment keys use `__` for nesting, so `BOOKDESK_DEFAULTS__PAGE_SIZE`
/// sets `defaults.page_size` while `BOOKDESK_DEFAULT_PROFILE` stays a
/// top-level key.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BOOKDESK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ConsoleConfig` from a profile and the global defaults. With no
/// profile the default local backend is used.
pub fn profile_to_console_config(
    profile: Option<&Profile>,
    defaults: &Defaults,
) -> Result<ConsoleConfig, ConfigError> {
    let fallback = Profile::default();
    let profile = profile.unwrap_or(&fallback);

    let api_url: url::Url = profile
        .api_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {}", profile.api_url),
        })?;
    if !matches!(api_url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("expected http or https, got '{}'", api_url.scheme()),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let config = ConsoleConfig::new(api_url.as_str())
        .map_err(|e| ConfigError::Validation {
            field: "api_url".into(),
            reason: e.to_string(),
        })?
        .with_timeout(Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)))
        .with_page_size(profile.page_size.unwrap_or(defaults.page_size))
        .with_tls(tls);
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.page_size, 20);
        assert_eq!(cfg.defaults.output, "table");
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "staging"

[defaults]
output = "json"
timeout = 5

[profiles.staging]
api_url = "https://staging.example.com/backend"
email = "ops@example.com"
page_size = 50
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.active_profile_name(None), "staging");
        assert_eq!(cfg.active_profile_name(Some("prod")), "prod");
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.page_size, 20);

        let staging = &cfg.profiles["staging"];
        let console = profile_to_console_config(Some(staging), &cfg.defaults).unwrap();
        assert_eq!(console.api_url.as_str(), "https://staging.example.com/backend");
        assert_eq!(console.page_size, 50);
        assert_eq!(console.transport.timeout, Duration::from_secs(5));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "local".into(),
            Profile {
                email: Some("admin@example.com".into()),
                ..Profile::default()
            },
        );
        cfg.set_default_profile("local").unwrap();
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.profile_names(), vec!["local"]);
    }

    #[test]
    fn unknown_default_profile_is_rejected() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set_default_profile("ghost"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn no_profile_means_local_backend() {
        let console = profile_to_console_config(None, &Defaults::default()).unwrap();
        assert_eq!(console.api_url.as_str(), "http://localhost/idea-backend/public");
        assert!(matches!(console.transport.tls, TlsMode::System));
    }

    #[test]
    fn bad_urls_are_validation_errors() {
        let profile = Profile {
            api_url: "ftp://example.com".into(),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_console_config(Some(&profile), &Defaults::default()),
            Err(ConfigError::Validation { .. })
        ));
        let profile = Profile {
            api_url: "not a url".into(),
            ..Profile::default()
        };
        assert!(profile_to_console_config(Some(&profile), &Defaults::default()).is_err());
    }

    #[test]
    fn insecure_and_ca_select_tls_mode() {
        let insecure = Profile {
            insecure: Some(true),
            ..Profile::default()
        };
        let cfg = profile_to_console_config(Some(&insecure), &Defaults::default()).unwrap();
        assert!(matches!(cfg.transport.tls, TlsMode::DangerAcceptInvalid));

        let ca = Profile {
            ca_cert: Some("/etc/ssl/bookdesk.pem".into()),
            ..Profile::default()
        };
        let cfg = profile_to_console_config(Some(&ca), &Defaults::default()).unwrap();
        assert!(matches!(cfg.transport.tls, TlsMode::CustomCa(_)));
    }
}
