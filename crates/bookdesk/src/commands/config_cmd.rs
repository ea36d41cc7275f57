//! Config subcommand handlers.

use std::fmt::Write as _;
use std::path::PathBuf;

use dialoguer::{Confirm, Input};

use bookdesk_core::DEFAULT_API_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

/// Config as TOML-ish text, profiles sorted by name.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
        let _ = writeln!(out);
    }
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "page_size = {}", cfg.defaults.page_size);

    let mut names = cfg.profile_names();
    names.sort_unstable();
    for name in names {
        let Some(p) = cfg.profiles.get(name) else {
            continue;
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        if let Some(ref email) = p.email {
            let _ = writeln!(out, "email = \"{email}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(page_size) = p.page_size {
            let _ = writeln!(out, "page_size = {page_size}");
        }
    }

    out.trim_end().to_owned()
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.trim().parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("expected {expected}, got '{value}'"),
    })
}

/// Set one profile key from its string form. Empty clears optional keys.
fn set_profile_key(profile: &mut Profile, key: &str, value: &str) -> Result<(), CliError> {
    let cleared = value.trim().is_empty();
    match key {
        "api_url" => {
            url::Url::parse(value).map_err(|e| CliError::Validation {
                field: "api_url".into(),
                reason: e.to_string(),
            })?;
            profile.api_url = value.trim_end_matches('/').to_owned();
        }
        "email" => profile.email = (!cleared).then(|| value.trim().to_owned()),
        "ca_cert" => profile.ca_cert = (!cleared).then(|| PathBuf::from(value)),
        "insecure" => {
            profile.insecure = if cleared {
                None
            } else {
                Some(parse_value(key, value, "true or false")?)
            };
        }
        "timeout" => {
            profile.timeout = if cleared {
                None
            } else {
                Some(parse_value(key, value, "seconds")?)
            };
        }
        "page_size" => {
            profile.page_size = if cleared {
                None
            } else {
                Some(parse_value(key, value, "a row count")?)
            };
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: "unknown key; expected api_url, email, ca_cert, insecure, timeout or page_size"
                    .into(),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => format_config(&cfg),
                format => output::render_single(format, &cfg, format_config, format_config)?,
            };
            output::print_output(&out, global.quiet);
            output::status(global, &format!("# {}", config::config_path().display()));
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(name.clone()).or_default();
            set_profile_key(profile, &key, &value)?;
            if cfg.default_profile.is_none() {
                cfg.default_profile = Some(name.clone());
            }
            config::save_config(&cfg)?;
            output::status(global, &format!("✓ {name}.{key} updated"));
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let active = config::active_profile_name(global, &cfg);
            let mut names = cfg.profile_names();
            names.sort_unstable();
            if names.is_empty() {
                output::status(global, "No profiles configured. Run: bookdesk config init");
                return Ok(());
            }
            let lines: Vec<String> = names
                .iter()
                .map(|name| {
                    let marker = if *name == active { "*" } else { " " };
                    let url = cfg.profiles.get(*name).map_or("", |p| p.api_url.as_str());
                    format!("{marker} {name:<16}{url}")
                })
                .collect();
            output::print_output(&lines.join("\n"), global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            cfg.set_default_profile(&name)?;
            config::save_config(&cfg)?;
            output::status(global, &format!("✓ Default profile set to '{name}'"));
            Ok(())
        }
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    eprintln!("bookdesk configuration");
    eprintln!("   Config path: {}\n", config::config_path().display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(cfg.default_profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    let existing = cfg.profiles.get(&profile_name).cloned().unwrap_or_default();
    let api_url: String = Input::new()
        .with_prompt("Admin API URL")
        .default(if existing.api_url.is_empty() {
            DEFAULT_API_URL.to_owned()
        } else {
            existing.api_url.clone()
        })
        .validate_with(|input: &String| url::Url::parse(input).map(|_| ()).map_err(|e| e.to_string()))
        .interact_text()
        .map_err(prompt_err)?;

    let email: String = Input::new()
        .with_prompt("Login email (optional)")
        .default(existing.email.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let insecure = api_url.starts_with("https://")
        && Confirm::new()
            .with_prompt("Accept self-signed TLS certificates?")
            .default(existing.insecure.unwrap_or(false))
            .interact()
            .map_err(prompt_err)?;

    let mut profile = existing;
    set_profile_key(&mut profile, "api_url", &api_url)?;
    set_profile_key(&mut profile, "email", &email)?;
    profile.insecure = insecure.then_some(true);

    cfg.profiles.insert(profile_name.clone(), profile);
    if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
        cfg.default_profile = Some(profile_name.clone());
    }
    let path = config::save_config(&cfg)?;

    eprintln!("\n✓ Profile '{profile_name}' saved to {}", path.display());
    if !global.quiet {
        eprintln!("   Next: bookdesk -p {profile_name} login");
    }
    Ok(())
}
