//! Book command handlers.

use serde_json::Value;
use tabled::Tabled;

use bookdesk_core::api::{AuthorRole, Book};
use bookdesk_core::form::SpecRow;
use bookdesk_core::ListResource;
use bookdesk_core::{BookForm, BookList, Console, DeleteOptions, FormModal};

use crate::cli::{AuthorArg, BookFields, BooksArgs, BooksCommand, GlobalOpts, SpecArg};
use crate::error::CliError;
use crate::output;

use super::resource::{self, CliForm, CliResource, FormInput};
use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct BookRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Authors")]
    authors: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Featured")]
    featured: String,
}

impl From<&Book> for BookRow {
    fn from(b: &Book) -> Self {
        let category = match (&b.category_name, &b.subcategory_name) {
            (Some(c), Some(s)) => format!("{c} / {s}"),
            (Some(c), None) => c.clone(),
            _ => String::new(),
        };
        Self {
            id: b.id,
            title: b.title.clone(),
            authors: author_names(b),
            category,
            active: output::yes_no(b.is_active).into(),
            featured: if b.is_featured { "★" } else { "" }.into(),
        }
    }
}

/// List rows carry a joined name string; the detail endpoint has records.
fn author_names(b: &Book) -> String {
    if b.authors.is_empty() {
        return b.author_names.clone().unwrap_or_default();
    }
    b.authors
        .iter()
        .map(|a| match a.role {
            AuthorRole::Author => a.name.clone(),
            role => format!("{} ({role})", a.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn detail(b: &Book) -> String {
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
    let id = |v: Option<u64>| v.map_or_else(|| "-".into(), |id| format!("#{id}"));
    let mut lines = vec![
        format!("ID:            {}", b.id),
        format!("Title:         {}", b.title),
        format!("Slug:          {}", b.slug),
        format!(
            "Category:      {} {}",
            opt(&b.category_name),
            id(b.category_id)
        ),
        format!(
            "Subcategory:   {} {}",
            opt(&b.subcategory_name),
            id(b.subcategory_id)
        ),
        format!("Authors:       {}", author_names(b)),
        format!("Active:        {}", output::yes_no(b.is_active)),
        format!("Featured:      {}", output::yes_no(b.is_featured)),
        format!("File:          {}", opt(&b.file_key)),
        format!("Thumbnail:     {}", opt(&b.thumbnail)),
        format!("Meta title:    {}", opt(&b.meta_title)),
        format!("Meta desc:     {}", opt(&b.meta_description)),
        format!("Created:       {}", opt(&b.created_at)),
    ];
    if !b.specifications.is_empty() {
        lines.push("Specifications:".into());
        for spec in &b.specifications {
            let group = spec.group.as_deref().map(|g| format!("{g} / ")).unwrap_or_default();
            let hidden = if spec.is_visible { "" } else { " (hidden)" };
            lines.push(format!("  {group}{}: {}{hidden}", spec.name, spec.value));
        }
    }
    if let Some(ref short) = b.short_description {
        lines.push(String::new());
        lines.push(short.clone());
    }
    lines.join("\n")
}

// ── Resource wiring ─────────────────────────────────────────────────

impl CliResource for BookList {
    type Form = BookForm;
    type Row = BookRow;

    fn row(item: &Book) -> BookRow {
        BookRow::from(item)
    }

    fn detail(item: &Book) -> String {
        detail(item)
    }

    async fn fetch_one(console: &Console, key: &str) -> Result<Book, CliError> {
        let id = util::parse_id(Self::RESOURCE, key)?;
        console
            .client()
            .get_book(id)
            .await
            .map_err(|e| util::lookup_err(Self::RESOURCE, key, e))
    }
}

impl CliForm for BookForm {
    fn apply_json_extra(form: &mut FormModal<Self>, name: &str, value: &Value) -> Result<bool, CliError> {
        match name {
            "authors" => {
                let authors = json_authors(value)?;
                replace_authors(form, &authors);
                Ok(true)
            }
            "specifications" => {
                let specs = json_specs(value)?;
                replace_specs(form, &specs)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> CliError {
    CliError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

/// `[3, {"id": 4, "role": "translator"}]`
fn json_authors(value: &Value) -> Result<Vec<AuthorArg>, CliError> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid("authors", "expected an array"))?;
    items
        .iter()
        .map(|item| {
            let (id, role) = match item {
                Value::Object(map) => (map.get("id"), map.get("role").and_then(Value::as_str)),
                other => (Some(other), None),
            };
            let id = id
                .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
                .ok_or_else(|| invalid("authors", format!("no numeric id in {item}")))?;
            let role = match role {
                Some(r) => r
                    .parse()
                    .map_err(|_| invalid("authors", format!("unknown role '{r}'")))?,
                None => AuthorRole::default(),
            };
            Ok(AuthorArg { id, role })
        })
        .collect()
}

/// `[{"name": "Pages", "value": 412, "group": "Print", "is_visible": 0}]`
fn json_specs(value: &Value) -> Result<Vec<SpecArg>, CliError> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid("specifications", "expected an array"))?;
    let text = |v: Option<&Value>| match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    Ok(items
        .iter()
        .map(|item| SpecArg {
            group: text(item.get("group")),
            name: text(item.get("name")),
            value: text(item.get("value")),
            visible: match item.get("is_visible") {
                Some(Value::Bool(b)) => *b,
                Some(Value::Number(n)) => n.as_u64() != Some(0),
                _ => true,
            },
        })
        .collect())
}

fn add_authors(form: &mut FormModal<BookForm>, authors: &[AuthorArg]) {
    let picker = &mut form.extras_mut().authors;
    for author in authors {
        if !picker.select(author.id, author.role) {
            tracing::debug!(id = author.id, "author already attached");
        }
    }
}

fn replace_authors(form: &mut FormModal<BookForm>, authors: &[AuthorArg]) {
    let picker = &mut form.extras_mut().authors;
    while picker.remove(0).is_some() {}
    add_authors(form, authors);
}

fn add_specs(form: &mut FormModal<BookForm>, specs: &[SpecArg]) -> Result<(), CliError> {
    let editor = &mut form.extras_mut().specifications;
    for spec in specs {
        let mut row = SpecRow::new(&spec.name, &spec.value).in_group(&spec.group);
        if !spec.visible {
            row = row.hidden();
        }
        editor.add(row)?;
    }
    Ok(())
}

fn replace_specs(form: &mut FormModal<BookForm>, specs: &[SpecArg]) -> Result<(), CliError> {
    let editor = &mut form.extras_mut().specifications;
    while editor.remove(0).is_some() {}
    add_specs(form, specs)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(console: &Console, args: BooksArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        BooksCommand::List {
            list,
            category_id,
            featured,
        } => {
            let mut filters = Vec::new();
            if let Some(id) = category_id {
                filters.push(("category_id", id.to_string()));
            }
            if featured {
                filters.push(("featured", "1".to_owned()));
            }
            resource::list::<BookList>(console, &list, &filters, global).await
        }

        BooksCommand::Get { id } => resource::get::<BookList>(console, &id, global).await,

        BooksCommand::Create(fields) => save(console, None, fields, global).await,

        BooksCommand::Update { id, fields } => save(console, Some(&id), fields, global).await,

        BooksCommand::Delete { id, delete_file } => {
            resource::delete::<BookList>(console, &id, DeleteOptions { delete_file }, global).await
        }
    }
}

async fn save(
    console: &Console,
    id: Option<&str>,
    fields: BookFields,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let BookFields {
        file,
        title,
        slug,
        category_id,
        subcategory_id,
        short_description,
        long_description,
        meta_title,
        meta_description,
        active,
        featured,
        book_file,
        thumbnail,
        clear_thumbnail,
        authors,
        clear_authors,
        specs,
        clear_specs,
    } = fields;

    // Title before slug: an explicit slug wins over the derived one.
    let input = FormInput::new(file.from_file)
        .text("title", title)
        .text("slug", slug)
        .id("category_id", category_id)
        .id("subcategory_id", subcategory_id)
        .text("short_description", short_description)
        .text("long_description", long_description)
        .text("meta_title", meta_title)
        .text("meta_description", meta_description)
        .flag("is_active", active)
        .flag("is_featured", featured)
        .upload("file_key", book_file)
        .upload("thumbnail", thumbnail)
        .clear_upload("thumbnail", clear_thumbnail);

    resource::save::<BookList>(console, id, input, global, |form| {
        if clear_authors {
            replace_authors(form, &authors);
        } else {
            add_authors(form, &authors);
        }
        if clear_specs {
            replace_specs(form, &specs)
        } else {
            add_specs(form, &specs)
        }
    })
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn book() -> Book {
        serde_json::from_value(json!({
            "id": 5,
            "title": "Dune",
            "slug": "dune",
            "category_name": "Sci-Fi",
            "authors": [
                {"id": 3, "name": "Frank Herbert", "role": "author"},
                {"id": 8, "name": "Ann Smith", "role": "translator"}
            ],
            "specifications": [{"name": "Pages", "value": "412", "group": "Print", "is_visible": 0}],
            "is_active": 1,
            "is_featured": 1
        }))
        .unwrap()
    }

    #[test]
    fn row_shows_roles_other_than_author() {
        let row = BookRow::from(&book());
        assert_eq!(row.authors, "Frank Herbert, Ann Smith (translator)");
        assert_eq!(row.category, "Sci-Fi");
        assert_eq!(row.featured, "★");
    }

    #[test]
    fn list_rows_fall_back_to_joined_names() {
        let mut b = book();
        b.authors.clear();
        b.author_names = Some("Frank Herbert".into());
        assert_eq!(author_names(&b), "Frank Herbert");
    }

    #[test]
    fn detail_lists_specifications() {
        let text = detail(&book());
        assert!(text.contains("Category:      Sci-Fi -"));
        assert!(text.contains("  Print / Pages: 412 (hidden)"));
    }

    #[test]
    fn json_authors_accept_ids_and_objects() {
        let authors = json_authors(&json!([3, "4", {"id": 5, "role": "Editor"}])).unwrap();
        assert_eq!(
            authors.iter().map(|a| (a.id, a.role)).collect::<Vec<_>>(),
            vec![
                (3, AuthorRole::Author),
                (4, AuthorRole::Author),
                (5, AuthorRole::Editor)
            ]
        );
        assert!(json_authors(&json!({"id": 3})).is_err());
        assert!(json_authors(&json!([{"id": 3, "role": "ghost"}])).is_err());
    }

    #[test]
    fn json_specs_read_wire_shape() {
        let specs = json_specs(&json!([
            {"name": "Pages", "value": 412, "group": null, "is_visible": 0}
        ]))
        .unwrap();
        assert_eq!(specs[0].value, "412");
        assert_eq!(specs[0].group, "");
        assert!(!specs[0].visible);
    }
}
