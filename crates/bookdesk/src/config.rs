//! CLI configuration -- thin wrapper around `bookdesk_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--api-url, --timeout, --insecure).

use std::sync::Arc;

use bookdesk_config::KeyringTokenStore;
use bookdesk_core::Console;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use bookdesk_config::{
    Config, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// The profile to run against, with CLI flag overrides applied.
///
/// A profile named explicitly with `--profile` must exist unless
/// `--api-url` supplies everything needed.
pub fn resolve_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    let mut profile = match config.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() && global.api_url.is_none() => {
            let available = config.profile_names().join(", ");
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available
                },
            });
        }
        None => Profile::default(),
    };

    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    Ok((name, profile))
}

/// Build the console for the active profile, with its token store.
pub fn build_console(global: &GlobalOpts) -> Result<(Console, String), CliError> {
    let cfg = load_config_or_default();
    let (name, profile) = resolve_profile(global, &cfg)?;
    let console_config = bookdesk_config::profile_to_console_config(Some(&profile), &cfg.defaults)?;
    tracing::debug!(profile = %name, api_url = %console_config.api_url, "resolved profile");

    let store = Arc::new(KeyringTokenStore::new(&name));
    let console = Console::new(console_config, store)?;
    Ok((console, name))
}
