//! Command dispatch: bridges CLI args to console screens and output formatting.

pub mod auth;
pub mod authors;
pub mod books;
pub mod categories;
pub mod config_cmd;
pub mod dashboard;
pub mod resource;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod users;
pub mod util;

use bookdesk_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a console-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    console: &Console,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => return auth::login(console, args, profile, global).await,
        Command::Logout => {
            auth::logout(console, global);
            return Ok(());
        }
        Command::Whoami => return auth::whoami(console, profile, global),
        _ => util::require_session(console, profile)?,
    }

    match cmd {
        Command::Books(args) => books::handle(console, args, global).await,
        Command::Authors(args) => authors::handle(console, args, global).await,
        Command::Categories(args) => categories::handle(console, args, global).await,
        Command::Subcategories(args) => categories::handle_sub(console, args, global).await,
        Command::Users(args) => users::handle(console, args, global).await,
        Command::Settings(args) => settings::handle(console, args, global).await,
        Command::Storage(args) => storage::handle(console, args, global).await,
        Command::Dashboard(args) => dashboard::handle(console, args, global).await,
        Command::Stats(args) => stats::handle(console, args, global).await,
        Command::Login(_)
        | Command::Logout
        | Command::Whoami
        | Command::Config(_)
        | Command::Completions(_) => Err(CliError::Internal(
            "command is handled before dispatch".into(),
        )),
    }
}
