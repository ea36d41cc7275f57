// Book form: the only schema with nested collections (authors and
// specifications) and two upload fields.

use bookdesk_api::{
    AdminClient, Author, AuthorRef, AuthorRole, Book, BookAuthor, BookPayload, BookSpecification,
    Category, ListParams, SpecificationPayload, StorageCategory, Subcategory,
};
use serde_json::Value;
use tracing::warn;

use super::{
    FieldDescriptor, FormMode, FormModal, FormSchema, FormValues, SlugRule, UploadField, Uploads,
};
use crate::error::CoreError;
use crate::resource::Resource;

/// Authors and subcategories are loaded in one page this large.
const OPTION_LIMIT: u32 = 200;
const CANDIDATE_LIMIT: usize = 5;

// ── Author picker ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedAuthor {
    pub id: u64,
    /// Display only; never sent.
    pub name: String,
    pub role: AuthorRole,
}

/// Ordered, duplicate-free list of authors attached to a book.
#[derive(Debug, Clone, Default)]
pub struct AuthorPicker {
    options: Vec<Author>,
    selected: Vec<SelectedAuthor>,
    pub search: String,
    pub pending: Option<u64>,
    pub role: AuthorRole,
}

impl AuthorPicker {
    pub fn set_options(&mut self, options: Vec<Author>) {
        self.options = options;
    }

    pub fn options(&self) -> &[Author] {
        &self.options
    }

    /// The first few authors whose name contains the search text.
    pub fn candidates(&self) -> Vec<&Author> {
        let needle = self.search.trim().to_lowercase();
        self.options
            .iter()
            .filter(|a| a.name.to_lowercase().contains(&needle))
            .take(CANDIDATE_LIMIT)
            .collect()
    }

    pub fn selected(&self) -> &[SelectedAuthor] {
        &self.selected
    }

    /// Add the pending author with the pending role. Returns `false` when
    /// nothing is pending or the author is already listed.
    pub fn add(&mut self) -> bool {
        let Some(id) = self.pending else {
            return false;
        };
        if self.selected.iter().any(|a| a.id == id) {
            return false;
        }
        let name = self
            .options
            .iter()
            .find(|a| a.id == id)
            .map_or_else(|| format!("#{id}"), |a| a.name.clone());
        self.selected.push(SelectedAuthor {
            id,
            name,
            role: self.role,
        });
        self.pending = None;
        self.search.clear();
        true
    }

    /// Pick and add in one step.
    pub fn select(&mut self, id: u64, role: AuthorRole) -> bool {
        self.pending = Some(id);
        self.role = role;
        self.add()
    }

    pub fn set_role(&mut self, index: usize, role: AuthorRole) -> bool {
        let Some(author) = self.selected.get_mut(index) else {
            return false;
        };
        author.role = role;
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<SelectedAuthor> {
        (index < self.selected.len()).then(|| self.selected.remove(index))
    }

    fn refs(&self) -> Vec<AuthorRef> {
        self.selected
            .iter()
            .map(|a| AuthorRef {
                id: a.id,
                role: a.role,
            })
            .collect()
    }

    fn from_record(authors: &[BookAuthor]) -> Self {
        Self {
            selected: authors
                .iter()
                .map(|a| SelectedAuthor {
                    id: a.id,
                    name: a.name.clone(),
                    role: a.role,
                })
                .collect(),
            ..Self::default()
        }
    }
}

// ── Specification editor ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRow {
    pub name: String,
    pub value: String,
    /// Blank means ungrouped.
    pub group: String,
    pub is_visible: bool,
}

impl SpecRow {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            group: String::new(),
            is_visible: true,
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_visible = false;
        self
    }

    fn check(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::invalid("spec_name", "Specification name is required"));
        }
        if self.value.trim().is_empty() {
            return Err(CoreError::invalid("spec_value", "Specification value is required"));
        }
        Ok(())
    }
}

/// Rows edited and removed by index. Nothing reorders them while the form
/// is open.
#[derive(Debug, Clone, Default)]
pub struct SpecificationEditor {
    rows: Vec<SpecRow>,
}

impl SpecificationEditor {
    pub fn rows(&self) -> &[SpecRow] {
        &self.rows
    }

    pub fn add(&mut self, row: SpecRow) -> Result<(), CoreError> {
        row.check()?;
        self.rows.push(row);
        Ok(())
    }

    pub fn update(&mut self, index: usize, row: SpecRow) -> Result<(), CoreError> {
        row.check()?;
        let slot = self
            .rows
            .get_mut(index)
            .ok_or_else(|| CoreError::Internal(format!("no specification at {index}")))?;
        *slot = row;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<SpecRow> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    /// Distinct non-blank groups, in first-seen order.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for row in &self.rows {
            let group = row.group.trim();
            if !group.is_empty() && !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }

    fn payload(&self) -> Vec<SpecificationPayload> {
        self.rows
            .iter()
            .map(|row| SpecificationPayload {
                name: row.name.clone(),
                value: row.value.clone(),
                group: Some(row.group.clone()).filter(|g| !g.trim().is_empty()),
                is_visible: bookdesk_api::bit(row.is_visible),
            })
            .collect()
    }

    fn from_record(specs: &[BookSpecification]) -> Self {
        Self {
            rows: specs
                .iter()
                .map(|s| SpecRow {
                    name: s.name.clone(),
                    value: s.value.clone(),
                    group: s.group.clone().unwrap_or_default(),
                    is_visible: s.is_visible,
                })
                .collect(),
        }
    }
}

// ── Schema ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct BookExtras {
    pub authors: AuthorPicker,
    pub specifications: SpecificationEditor,
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
}

pub struct BookForm;

impl FormSchema for BookForm {
    type Record = Book;
    type Extras = BookExtras;
    type Payload = BookPayload;

    const RESOURCE: Resource = Resource::Books;
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::text("title", "Title").required(),
        FieldDescriptor::text("slug", "Slug").required(),
        FieldDescriptor::select("category_id", "Category"),
        FieldDescriptor::select("subcategory_id", "Subcategory"),
        FieldDescriptor::long_text("short_description", "Short description"),
        FieldDescriptor::long_text("long_description", "Long description"),
        FieldDescriptor::text("meta_title", "Meta title"),
        FieldDescriptor::long_text("meta_description", "Meta description"),
        FieldDescriptor::flag("is_active", "Active", true),
        FieldDescriptor::flag("is_featured", "Featured", false),
    ];
    const SLUG: Option<SlugRule> = Some(SlugRule {
        source: "title",
        target: "slug",
    });
    const UPLOADS: &'static [UploadField] = &[
        UploadField {
            name: "file_key",
            category: StorageCategory::Books,
            success: "File uploaded",
            failure: "Failed to upload file",
        },
        UploadField {
            name: "thumbnail",
            category: StorageCategory::Thumbnails,
            success: "Thumbnail uploaded",
            failure: "Failed to upload thumbnail",
        },
    ];

    fn values(book: &Book) -> FormValues {
        let id = |v: Option<u64>| v.map(|id| id.to_string()).unwrap_or_default();
        FormValues::defaults(Self::FIELDS)
            .with_text("title", book.title.clone())
            .with_text("slug", book.slug.clone())
            .with_text("category_id", id(book.category_id))
            .with_text("subcategory_id", id(book.subcategory_id))
            .with_text("short_description", book.short_description.clone().unwrap_or_default())
            .with_text("long_description", book.long_description.clone().unwrap_or_default())
            .with_text("meta_title", book.meta_title.clone().unwrap_or_default())
            .with_text("meta_description", book.meta_description.clone().unwrap_or_default())
            .with_flag("is_active", book.is_active)
            .with_flag("is_featured", book.is_featured)
    }

    fn extras(book: &Book) -> BookExtras {
        BookExtras {
            authors: AuthorPicker::from_record(&book.authors),
            specifications: SpecificationEditor::from_record(&book.specifications),
            ..BookExtras::default()
        }
    }

    fn upload_keys(book: &Book) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("file_key", book.file_key.clone()),
            ("thumbnail", book.thumbnail.clone()),
        ]
    }

    fn payload(values: &FormValues, extras: &BookExtras, uploads: &Uploads, mode: FormMode) -> BookPayload {
        let meta = |name: &str, placeholder: &str| {
            values
                .opt_text(name)
                .or_else(|| (mode == FormMode::Create).then(|| placeholder.to_owned()))
        };
        BookPayload {
            title: values.text("title").to_owned(),
            slug: values.text("slug").to_owned(),
            short_description: values.opt_text("short_description"),
            long_description: values.opt_text("long_description"),
            category_id: values.id("category_id"),
            subcategory_id: values.id("subcategory_id"),
            file_key: uploads.key("file_key"),
            thumbnail: uploads.key("thumbnail"),
            is_featured: values.bit("is_featured"),
            is_active: values.bit("is_active"),
            meta_title: meta("meta_title", "Meta Title"),
            meta_description: meta("meta_description", "Meta Description"),
            authors: extras.authors.refs(),
            specifications: extras.specifications.payload(),
        }
    }

    /// List rows lack authors and specifications; edit starts from the
    /// detail record when it can be fetched.
    async fn hydrate(client: &AdminClient, book: Book) -> Book {
        match client.get_book(book.id).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(id = book.id, error = %e, "could not load book detail, editing list row");
                book
            }
        }
    }

    async fn prepare(client: &AdminClient, values: &FormValues, extras: &mut BookExtras) {
        match client.list_categories(&ListParams::default()).await {
            Ok(list) => extras.categories = list.items,
            Err(e) => warn!(error = %e, "could not load category options"),
        }
        match client.list_authors(&ListParams::page(1, OPTION_LIMIT)).await {
            Ok(list) => extras.authors.set_options(list.items),
            Err(e) => warn!(error = %e, "could not load author options"),
        }
        extras.subcategories = load_subcategories(client, values.id("category_id")).await;
    }

    async fn create(client: &AdminClient, payload: &BookPayload) -> Result<Value, bookdesk_api::Error> {
        client.create_book(payload).await
    }

    async fn update(client: &AdminClient, book: &Book, payload: &BookPayload) -> Result<Value, bookdesk_api::Error> {
        client.update_book(book.id, payload).await
    }
}

async fn load_subcategories(client: &AdminClient, category_id: Option<u64>) -> Vec<Subcategory> {
    let Some(category_id) = category_id else {
        return Vec::new();
    };
    let params = ListParams {
        limit: Some(OPTION_LIMIT),
        ..ListParams::default()
    }
    .with_filter("category_id", category_id);
    match client.list_subcategories(&params).await {
        Ok(list) => list.items,
        Err(e) => {
            warn!(category_id, error = %e, "could not load subcategory options");
            Vec::new()
        }
    }
}

impl FormModal<BookForm> {
    /// Change the category and reload the subcategory options for it.
    pub async fn select_category(&mut self, category_id: Option<u64>) -> Result<(), CoreError> {
        let value = category_id.map(|id| id.to_string()).unwrap_or_default();
        self.set_text("category_id", value)?;
        let subcategories = load_subcategories(self.console().client(), category_id).await;
        self.extras_mut().subcategories = subcategories;
        Ok(())
    }
}
