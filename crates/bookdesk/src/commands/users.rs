//! Admin user command handlers.

use secrecy::ExposeSecret;
use tabled::Tabled;

use bookdesk_core::api::User;
use bookdesk_core::{Console, DeleteOptions, UserForm, UserList};

use crate::cli::{GlobalOpts, UserFields, UsersArgs, UsersCommand};
use crate::error::CliError;

use super::resource::{self, CliForm, CliResource, FormInput};
use super::util;

#[derive(Tabled)]
pub struct UserRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.full_name.clone(),
            email: u.email.clone(),
            role: u.role.clone(),
            active: if u.is_active { "yes" } else { "no" }.into(),
        }
    }
}

// The users endpoint has no detail route; lookups go through the list.
impl CliResource for UserList {
    type Form = UserForm;
    type Row = UserRow;

    fn row(item: &User) -> UserRow {
        UserRow::from(item)
    }

    fn detail(u: &User) -> String {
        [
            format!("ID:      {}", u.id),
            format!("Name:    {}", u.full_name),
            format!("Email:   {}", u.email),
            format!("Role:    {}", u.role),
            format!("Active:  {}", if u.is_active { "yes" } else { "no" }),
        ]
        .join("\n")
    }
}

impl CliForm for UserForm {}

pub async fn handle(console: &Console, args: UsersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        UsersCommand::List(list) => resource::list::<UserList>(console, &list, &[], global).await,
        UsersCommand::Get { id } => resource::get::<UserList>(console, &id, global).await,
        UsersCommand::Create(fields) => save(console, None, fields, global).await,
        UsersCommand::Update { id, fields } => save(console, Some(&id), fields, global).await,
        UsersCommand::Delete { id } => {
            resource::delete::<UserList>(console, &id, DeleteOptions::default(), global).await
        }
    }
}

async fn save(
    console: &Console,
    id: Option<&str>,
    fields: UserFields,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let password = if fields.password || fields.password_stdin {
        let secret = util::read_secret("Password: ", fields.password_stdin)?;
        Some(secret.expose_secret().to_owned())
    } else {
        None
    };
    let input = FormInput::new(fields.file.from_file)
        .text("full_name", fields.full_name)
        .text("email", fields.email)
        .text("password", password)
        .text("role", fields.role)
        .flag("is_active", fields.active);
    resource::save::<UserList>(console, id, input, global, |_| Ok(())).await
}
