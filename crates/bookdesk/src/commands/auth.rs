//! Login, logout and whoami.

use std::io::{self, IsTerminal};

use serde::Serialize;

use bookdesk_core::{Console, CoreError};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn login(
    console: &Console,
    args: LoginArgs,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let saved_email = config::resolve_profile(global, &config::load_config_or_default())
        .ok()
        .and_then(|(_, p)| p.email);

    let email = match args.email.or_else(|| saved_email.clone().filter(|_| args.password_stdin)) {
        Some(email) => email,
        None if io::stdin().is_terminal() => {
            let mut input = dialoguer::Input::<String>::new().with_prompt("Email");
            if let Some(ref saved) = saved_email {
                input = input.default(saved.clone());
            }
            input.interact_text().map_err(util::prompt_err)?
        }
        None => {
            return Err(CliError::Validation {
                field: "email".into(),
                reason: "pass --email when stdin is not a terminal".into(),
            });
        }
    };
    let password = util::read_secret("Password: ", args.password_stdin)?;

    let pb = util::spinner(global, format!("Signing in as {email}"));
    let result = console.login(&email, &password).await;
    pb.finish_and_clear();

    let user = result.map_err(|e| match e {
        CoreError::Api {
            status: Some(_),
            message,
        } => CliError::LoginFailed {
            message: message.unwrap_or_else(|| "invalid credentials".into()),
        },
        CoreError::Unauthorized => CliError::LoginFailed {
            message: "invalid credentials".into(),
        },
        other => other.into(),
    })?;

    tracing::info!(profile, role = %user.role, "logged in");
    output::status(global, &format!("Logged in as {} ({})", user.name, user.role));
    Ok(())
}

pub fn logout(console: &Console, global: &GlobalOpts) {
    console.logout();
    output::status(global, "Logged out");
}

#[derive(Debug, Serialize)]
struct Identity {
    profile: String,
    api_url: String,
    email: Option<String>,
    name: Option<String>,
    role: Option<String>,
    authenticated: bool,
}

pub fn whoami(console: &Console, profile: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let email = config::resolve_profile(global, &config::load_config_or_default())
        .ok()
        .and_then(|(_, p)| p.email);
    let session = console.session().current();
    let identity = Identity {
        profile: profile.to_owned(),
        api_url: console.config().api_url.to_string(),
        email,
        name: session.user.as_ref().map(|u| u.name.clone()),
        role: session.user.as_ref().map(|u| u.role.clone()),
        authenticated: session.is_authenticated(),
    };

    let out = output::render_single(
        global.output,
        &identity,
        |i| {
            let mut lines = vec![
                format!("Profile:  {}", i.profile),
                format!("API:      {}", i.api_url),
                format!("Email:    {}", i.email.as_deref().unwrap_or("-")),
            ];
            if let Some(ref name) = i.name {
                lines.push(format!("User:     {name} ({})", i.role.as_deref().unwrap_or("-")));
            }
            lines.push(format!(
                "Session:  {}",
                if i.authenticated { "logged in" } else { "not logged in" }
            ));
            lines.join("\n")
        },
        |i| i.profile.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
