//! Author command handlers.

use tabled::Tabled;

use bookdesk_core::api::Author;
use bookdesk_core::ListResource;
use bookdesk_core::{AuthorForm, AuthorList, Console, DeleteOptions};

use crate::cli::{AuthorFields, AuthorsArgs, AuthorsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::resource::{self, CliForm, CliResource, FormInput};
use super::util;

#[derive(Tabled)]
pub struct AuthorRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Portrait")]
    image: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl From<&Author> for AuthorRow {
    fn from(a: &Author) -> Self {
        Self {
            id: a.id,
            name: a.name.clone(),
            slug: a.slug.clone(),
            image: if a.image.is_some() { "yes" } else { "" }.into(),
            active: output::yes_no(a.is_active).into(),
        }
    }
}

fn detail(a: &Author) -> String {
    let mut lines = vec![
        format!("ID:        {}", a.id),
        format!("Name:      {}", a.name),
        format!("Slug:      {}", a.slug),
        format!("Portrait:  {}", a.image.as_deref().unwrap_or("-")),
        format!("Active:    {}", output::yes_no(a.is_active)),
    ];
    if let Some(ref bio) = a.bio {
        lines.push(String::new());
        lines.push(bio.clone());
    }
    lines.join("\n")
}

impl CliResource for AuthorList {
    type Form = AuthorForm;
    type Row = AuthorRow;

    fn row(item: &Author) -> AuthorRow {
        AuthorRow::from(item)
    }

    fn detail(item: &Author) -> String {
        detail(item)
    }

    async fn fetch_one(console: &Console, key: &str) -> Result<Author, CliError> {
        let id = util::parse_id(Self::RESOURCE, key)?;
        console
            .client()
            .get_author(id)
            .await
            .map_err(|e| util::lookup_err(Self::RESOURCE, key, e))
    }
}

impl CliForm for AuthorForm {}

pub async fn handle(console: &Console, args: AuthorsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AuthorsCommand::List(list) => resource::list::<AuthorList>(console, &list, &[], global).await,
        AuthorsCommand::Get { id } => resource::get::<AuthorList>(console, &id, global).await,
        AuthorsCommand::Create(fields) => save(console, None, fields, global).await,
        AuthorsCommand::Update { id, fields } => save(console, Some(&id), fields, global).await,
        AuthorsCommand::Delete { id } => {
            resource::delete::<AuthorList>(console, &id, DeleteOptions::default(), global).await
        }
    }
}

async fn save(
    console: &Console,
    id: Option<&str>,
    fields: AuthorFields,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let input = FormInput::new(fields.file.from_file)
        .text("name", fields.name)
        .text("slug", fields.slug)
        .text("bio", fields.bio)
        .flag("is_active", fields.active)
        .upload("image", fields.image)
        .clear_upload("image", fields.clear_image);
    resource::save::<AuthorList>(console, id, input, global, |_| Ok(())).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn detail_appends_bio() {
        let author: Author = serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "Frank Herbert",
            "slug": "frank-herbert",
            "bio": "Wrote Dune.",
            "is_active": "1"
        }))
        .unwrap();
        let text = detail(&author);
        assert!(text.contains("Portrait:  -"));
        assert!(text.ends_with("\n\nWrote Dune."));
        assert_eq!(AuthorRow::from(&author).active, "yes");
    }
}
