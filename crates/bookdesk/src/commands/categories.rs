//! Category and subcategory command handlers.

use tabled::Tabled;

use bookdesk_core::api::{Category, Subcategory};
use bookdesk_core::ListResource;
use bookdesk_core::{
    CategoryForm, CategoryList, Console, DeleteOptions, SubcategoryForm, SubcategoryList,
};

use crate::cli::{
    CategoriesArgs, CategoriesCommand, CategoryFields, GlobalOpts, SubcategoriesArgs,
    SubcategoriesCommand, SubcategoryFields,
};
use crate::error::CliError;
use crate::output;

use super::resource::{self, CliForm, CliResource, FormInput};
use super::util;

// ── Categories ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct CategoryRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl From<&Category> for CategoryRow {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            slug: c.slug.clone(),
            active: output::yes_no(c.is_active).into(),
        }
    }
}

impl CliResource for CategoryList {
    type Form = CategoryForm;
    type Row = CategoryRow;

    fn row(item: &Category) -> CategoryRow {
        CategoryRow::from(item)
    }

    fn detail(c: &Category) -> String {
        [
            format!("ID:           {}", c.id),
            format!("Name:         {}", c.name),
            format!("Slug:         {}", c.slug),
            format!("Description:  {}", c.description.as_deref().unwrap_or("-")),
            format!("Active:       {}", output::yes_no(c.is_active)),
        ]
        .join("\n")
    }

    async fn fetch_one(console: &Console, key: &str) -> Result<Category, CliError> {
        let id = util::parse_id(Self::RESOURCE, key)?;
        console
            .client()
            .get_category(id)
            .await
            .map_err(|e| util::lookup_err(Self::RESOURCE, key, e))
    }
}

impl CliForm for CategoryForm {}

pub async fn handle(console: &Console, args: CategoriesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        CategoriesCommand::List(list) => {
            resource::list::<CategoryList>(console, &list, &[], global).await
        }
        CategoriesCommand::Get { id } => resource::get::<CategoryList>(console, &id, global).await,
        CategoriesCommand::Create(fields) => save_category(console, None, fields, global).await,
        CategoriesCommand::Update { id, fields } => {
            save_category(console, Some(&id), fields, global).await
        }
        CategoriesCommand::Delete { id } => {
            resource::delete::<CategoryList>(console, &id, DeleteOptions::default(), global).await
        }
    }
}

async fn save_category(
    console: &Console,
    id: Option<&str>,
    fields: CategoryFields,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let input = FormInput::new(fields.file.from_file)
        .text("name", fields.name)
        .text("slug", fields.slug)
        .text("description", fields.description)
        .flag("is_active", fields.active);
    resource::save::<CategoryList>(console, id, input, global, |_| Ok(())).await
}

// ── Subcategories ───────────────────────────────────────────────────

#[derive(Tabled)]
pub struct SubcategoryRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl From<&Subcategory> for SubcategoryRow {
    fn from(s: &Subcategory) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            slug: s.slug.clone(),
            category: category_label(s),
            active: output::yes_no(s.is_active).into(),
        }
    }
}

fn category_label(s: &Subcategory) -> String {
    match (&s.category_name, s.category_id) {
        (Some(name), _) => name.clone(),
        (None, Some(id)) => format!("#{id}"),
        (None, None) => String::new(),
    }
}

impl CliResource for SubcategoryList {
    type Form = SubcategoryForm;
    type Row = SubcategoryRow;

    fn row(item: &Subcategory) -> SubcategoryRow {
        SubcategoryRow::from(item)
    }

    fn detail(s: &Subcategory) -> String {
        [
            format!("ID:        {}", s.id),
            format!("Name:      {}", s.name),
            format!("Slug:      {}", s.slug),
            format!("Category:  {}", category_label(s)),
            format!("Active:    {}", output::yes_no(s.is_active)),
        ]
        .join("\n")
    }

    async fn fetch_one(console: &Console, key: &str) -> Result<Subcategory, CliError> {
        let id = util::parse_id(Self::RESOURCE, key)?;
        console
            .client()
            .get_subcategory(id)
            .await
            .map_err(|e| util::lookup_err(Self::RESOURCE, key, e))
    }
}

impl CliForm for SubcategoryForm {}

pub async fn handle_sub(
    console: &Console,
    args: SubcategoriesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SubcategoriesCommand::List { list, category_id } => {
            let filters: Vec<_> = category_id
                .map(|id| ("category_id", id.to_string()))
                .into_iter()
                .collect();
            resource::list::<SubcategoryList>(console, &list, &filters, global).await
        }
        SubcategoriesCommand::Get { id } => {
            resource::get::<SubcategoryList>(console, &id, global).await
        }
        SubcategoriesCommand::Create(fields) => save_subcategory(console, None, fields, global).await,
        SubcategoriesCommand::Update { id, fields } => {
            save_subcategory(console, Some(&id), fields, global).await
        }
        SubcategoriesCommand::Delete { id } => {
            resource::delete::<SubcategoryList>(console, &id, DeleteOptions::default(), global).await
        }
    }
}

async fn save_subcategory(
    console: &Console,
    id: Option<&str>,
    fields: SubcategoryFields,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let input = FormInput::new(fields.file.from_file)
        .text("name", fields.name)
        .text("slug", fields.slug)
        .id("category_id", fields.category_id)
        .flag("is_active", fields.active);
    resource::save::<SubcategoryList>(console, id, input, global, |_| Ok(())).await
}
