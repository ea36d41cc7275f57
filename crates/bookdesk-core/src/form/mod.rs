// ── Generic form/modal controller ──
//
// One state machine shared by every resource form. A `FormSchema`
// describes the fields, how a record fills the form and how the values
// become a payload. `FormModal` owns the mode, the values, the upload
// slots, slug tracking, validation and submission.

mod book;
mod schemas;
pub mod validate;

use std::future::Future;

use bookdesk_api::{AdminClient, StorageCategory};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use strum::Display;
use tracing::{debug, info};

use crate::console::Console;
use crate::error::{CoreError, FieldErrors};
use crate::resource::Resource;
use crate::upload::{LocalFile, UploadOutcome, UploadSlot};

pub use book::{AuthorPicker, BookExtras, BookForm, SelectedAuthor, SpecRow, SpecificationEditor};
pub use schemas::{AuthorForm, CategoryForm, SettingForm, SubcategoryForm, UserForm};
pub use validate::{MIN_PASSWORD_LEN, is_email, slugify};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FormMode {
    Create,
    Edit,
}

// ── Field descriptors ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    LongText,
    Email,
    Password,
    /// Numeric foreign key chosen from a list of options.
    Select,
    Flag { default: bool },
}

/// Static description of one form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub min_len_on_create: Option<usize>,
    pub locked_on_edit: bool,
    pub default: &'static str,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            min_len_on_create: None,
            locked_on_edit: false,
            default: "",
        }
    }

    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub const fn long_text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::LongText)
    }

    pub const fn select(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Select)
    }

    pub const fn flag(name: &'static str, label: &'static str, default: bool) -> Self {
        Self::new(name, label, FieldKind::Flag { default })
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn min_len_on_create(mut self, len: usize) -> Self {
        self.min_len_on_create = Some(len);
        self
    }

    pub const fn locked_on_edit(mut self) -> Self {
        self.locked_on_edit = true;
        self
    }

    pub const fn default_text(mut self, value: &'static str) -> Self {
        self.default = value;
        self
    }

    fn is_flag(&self) -> bool {
        matches!(self.kind, FieldKind::Flag { .. })
    }
}

/// Which text field feeds which slug field.
#[derive(Debug, Clone, Copy)]
pub struct SlugRule {
    pub source: &'static str,
    pub target: &'static str,
}

/// A file field backed by an [`UploadSlot`].
#[derive(Debug, Clone, Copy)]
pub struct UploadField {
    pub name: &'static str,
    pub category: StorageCategory,
    pub success: &'static str,
    pub failure: &'static str,
}

// ── Values ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

/// Current form values, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(IndexMap<&'static str, FieldValue>);

impl FormValues {
    /// Every field at its default.
    pub fn defaults(fields: &[FieldDescriptor]) -> Self {
        Self(
            fields
                .iter()
                .map(|f| {
                    let value = match f.kind {
                        FieldKind::Flag { default } => FieldValue::Flag(default),
                        _ => FieldValue::Text(f.default.to_owned()),
                    };
                    (f.name, value)
                })
                .collect(),
        )
    }

    pub fn with_text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.0.insert(name, FieldValue::Text(value.into()));
        self
    }

    pub fn with_flag(mut self, name: &'static str, value: bool) -> Self {
        self.0.insert(name, FieldValue::Flag(value));
        self
    }

    /// Text value, `""` when unset or a flag.
    pub fn text(&self, name: &str) -> &str {
        match self.0.get(name) {
            Some(FieldValue::Text(value)) => value,
            _ => "",
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.0.get(name), Some(FieldValue::Flag(true)))
    }

    /// `1`/`0` for the wire.
    pub fn bit(&self, name: &str) -> u8 {
        bookdesk_api::bit(self.flag(name))
    }

    /// The text as typed, or `None` when blank.
    pub fn opt_text(&self, name: &str) -> Option<String> {
        let value = self.text(name);
        (!value.trim().is_empty()).then(|| value.to_owned())
    }

    /// Numeric id from a select field.
    pub fn id(&self, name: &str) -> Option<u64> {
        self.text(name).trim().parse().ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (*name, value))
    }

    fn put(&mut self, name: &'static str, value: FieldValue) {
        self.0.insert(name, value);
    }
}

/// Upload slots by field name.
#[derive(Debug, Clone, Default)]
pub struct Uploads(IndexMap<&'static str, UploadSlot>);

impl Uploads {
    fn for_fields(fields: &[UploadField]) -> Self {
        Self(
            fields
                .iter()
                .map(|f| (f.name, UploadSlot::new(f.category)))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&UploadSlot> {
        self.0.get(name)
    }

    /// Stored key for a field; `None` if never set.
    pub fn key(&self, name: &str) -> Option<String> {
        self.0.get(name).and_then(|slot| slot.key().map(str::to_owned))
    }

    pub fn any_in_progress(&self) -> bool {
        self.0.values().any(UploadSlot::is_uploading)
    }

    fn reset(&mut self) {
        self.0.values_mut().for_each(UploadSlot::reset);
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut UploadSlot, CoreError> {
        self.0
            .get_mut(name)
            .ok_or_else(|| CoreError::invalid(name, "Unknown upload field"))
    }
}

// ── Schema ───────────────────────────────────────────────────────────

/// Configuration for one resource form.
pub trait FormSchema: Send + Sync + 'static {
    /// The record an edit starts from.
    type Record: Clone + Send + Sync + 'static;
    /// Form state beyond plain fields (option lists, nested collections).
    type Extras: Default + Send + Sync;
    type Payload: Serialize + Send + Sync;

    const RESOURCE: Resource;
    const FIELDS: &'static [FieldDescriptor];
    const SLUG: Option<SlugRule> = None;
    const UPLOADS: &'static [UploadField] = &[];

    /// Field values for an existing record.
    fn values(record: &Self::Record) -> FormValues;

    fn extras(_record: &Self::Record) -> Self::Extras {
        Self::Extras::default()
    }

    /// Stored keys for each upload field of an existing record.
    fn upload_keys(_record: &Self::Record) -> Vec<(&'static str, Option<String>)> {
        Vec::new()
    }

    /// Rules beyond the per-field ones.
    fn check(_values: &FormValues, _extras: &Self::Extras, _mode: FormMode, _errors: &mut FieldErrors) {}

    /// Compose the request body. Only called once validation passed.
    fn payload(values: &FormValues, extras: &Self::Extras, uploads: &Uploads, mode: FormMode) -> Self::Payload;

    /// Replace a list row with the full record before editing.
    fn hydrate(_client: &AdminClient, record: Self::Record) -> impl Future<Output = Self::Record> + Send {
        async move { record }
    }

    /// Load option lists the form needs.
    fn prepare(
        _client: &AdminClient,
        _values: &FormValues,
        _extras: &mut Self::Extras,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn create(
        client: &AdminClient,
        payload: &Self::Payload,
    ) -> impl Future<Output = Result<Value, bookdesk_api::Error>> + Send;

    fn update(
        client: &AdminClient,
        record: &Self::Record,
        payload: &Self::Payload,
    ) -> impl Future<Output = Result<Value, bookdesk_api::Error>> + Send;
}

// ── FormModal ────────────────────────────────────────────────────────

/// Create/edit modal for one resource.
pub struct FormModal<S: FormSchema> {
    console: Console,
    open: bool,
    mode: FormMode,
    record: Option<S::Record>,
    values: FormValues,
    extras: S::Extras,
    uploads: Uploads,
    slug_touched: bool,
    errors: FieldErrors,
}

impl<S: FormSchema> FormModal<S> {
    pub fn new(console: Console) -> Self {
        Self {
            console,
            open: false,
            mode: FormMode::Create,
            record: None,
            values: FormValues::defaults(S::FIELDS),
            extras: S::Extras::default(),
            uploads: Uploads::for_fields(S::UPLOADS),
            slug_touched: false,
            errors: FieldErrors::new(),
        }
    }

    /// Open empty. Every piece of auxiliary state goes back to its default.
    pub async fn open_create(&mut self) {
        self.mode = FormMode::Create;
        self.record = None;
        self.values = FormValues::defaults(S::FIELDS);
        self.extras = S::Extras::default();
        self.uploads.reset();
        self.slug_touched = false;
        self.errors.clear();
        S::prepare(self.console.client(), &self.values, &mut self.extras).await;
        self.open = true;
    }

    /// Open on an existing record. The slug is user-controlled from here on.
    pub async fn open_edit(&mut self, record: S::Record) {
        let record = S::hydrate(self.console.client(), record).await;
        self.mode = FormMode::Edit;
        self.values = S::values(&record);
        self.extras = S::extras(&record);
        self.uploads.reset();
        for (name, key) in S::upload_keys(&record) {
            if let Ok(slot) = self.uploads.slot_mut(name) {
                slot.load_key(self.console.client(), key).await;
            }
        }
        self.record = Some(record);
        self.slug_touched = true;
        self.errors.clear();
        S::prepare(self.console.client(), &self.values, &mut self.extras).await;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn record(&self) -> Option<&S::Record> {
        self.record.as_ref()
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn extras(&self) -> &S::Extras {
        &self.extras
    }

    pub fn extras_mut(&mut self) -> &mut S::Extras {
        &mut self.extras
    }

    pub fn uploads(&self) -> &Uploads {
        &self.uploads
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn slug_touched(&self) -> bool {
        self.slug_touched
    }

    pub(crate) fn console(&self) -> &Console {
        &self.console
    }

    fn field(name: &str) -> Result<&'static FieldDescriptor, CoreError> {
        S::FIELDS
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| CoreError::invalid(name, "Unknown field"))
    }

    fn writable(&self, name: &str) -> Result<&'static FieldDescriptor, CoreError> {
        let field = Self::field(name)?;
        if field.locked_on_edit && self.mode == FormMode::Edit {
            return Err(CoreError::invalid(
                field.name,
                format!("{} cannot be changed", field.label),
            ));
        }
        Ok(field)
    }

    /// Type into a text field. Typing into the slug stops auto-derivation;
    /// typing into its source re-derives it while still in create mode.
    pub fn set_text(&mut self, name: &str, value: impl Into<String>) -> Result<(), CoreError> {
        let field = self.writable(name)?;
        if field.is_flag() {
            return Err(CoreError::invalid(field.name, format!("{} is a toggle", field.label)));
        }
        let value = value.into();

        if let Some(rule) = S::SLUG {
            if field.name == rule.target {
                self.slug_touched = true;
            } else if field.name == rule.source && self.mode == FormMode::Create && !self.slug_touched {
                self.values.put(rule.target, FieldValue::Text(slugify(&value)));
            }
        }
        self.values.put(field.name, FieldValue::Text(value));
        self.errors.shift_remove(field.name);
        Ok(())
    }

    pub fn set_flag(&mut self, name: &str, value: bool) -> Result<(), CoreError> {
        let field = self.writable(name)?;
        if !field.is_flag() {
            return Err(CoreError::invalid(field.name, format!("{} is not a toggle", field.label)));
        }
        self.values.put(field.name, FieldValue::Flag(value));
        Ok(())
    }

    // ── Uploads ──────────────────────────────────────────────────────

    fn upload_field(name: &str) -> Result<&'static UploadField, CoreError> {
        S::UPLOADS
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| CoreError::invalid(name, "Unknown upload field"))
    }

    /// Show the local preview and mark the field busy.
    pub fn select_file(&mut self, name: &str, file: LocalFile) -> Result<(), CoreError> {
        self.uploads.slot_mut(name)?.select(file);
        Ok(())
    }

    /// Upload whatever [`select_file`](Self::select_file) picked.
    pub async fn upload_selected(&mut self, name: &str) -> Result<(), CoreError> {
        let field = Self::upload_field(name)?;
        let slot = self.uploads.slot_mut(name)?;
        match slot.upload_selected(self.console.client()).await {
            Ok(UploadOutcome::Resolved) => {
                self.console.notifier().success(field.success);
                Ok(())
            }
            // The key is kept; only the preview is missing.
            Ok(UploadOutcome::Unresolved) => {
                self.console.notifier().error(field.failure);
                Ok(())
            }
            Err(e) => {
                self.console.notifier().error(field.failure);
                Err(e)
            }
        }
    }

    pub async fn upload(&mut self, name: &str, file: LocalFile) -> Result<(), CoreError> {
        self.select_file(name, file)?;
        self.upload_selected(name).await
    }

    pub fn remove_upload(&mut self, name: &str) -> Result<(), CoreError> {
        self.uploads.slot_mut(name)?.remove();
        Ok(())
    }

    pub fn is_uploading(&self) -> bool {
        self.uploads.any_in_progress()
    }

    // ── Validation & submission ──────────────────────────────────────

    /// Check every rule and annotate the offending fields.
    pub fn validate(&mut self) -> Result<(), CoreError> {
        let mut errors = FieldErrors::new();
        validate::check_fields(S::FIELDS, &self.values, self.mode, &mut errors);
        S::check(&self.values, &self.extras, self.mode, &mut errors);
        self.errors.clone_from(&errors);
        if errors.is_empty() {
            Ok(())
        } else {
            debug!(resource = %S::RESOURCE, fields = errors.len(), "form rejected");
            Err(CoreError::Validation { errors })
        }
    }

    /// The body `submit` would send right now.
    pub fn payload(&self) -> S::Payload {
        S::payload(&self.values, &self.extras, &self.uploads, self.mode)
    }

    /// Create or update. On success the modal closes, the resource's lists
    /// are invalidated and a notification is published, in that order. On
    /// failure the modal stays open with everything the user typed.
    pub async fn submit(&mut self) -> Result<(), CoreError> {
        if self.is_uploading() {
            return Err(CoreError::UploadInProgress);
        }
        self.validate()?;

        let payload = self.payload();
        let client = self.console.client();
        let result = match (self.mode, &self.record) {
            (FormMode::Edit, Some(record)) => S::update(client, record, &payload).await,
            _ => S::create(client, &payload).await,
        };

        match result {
            Ok(_) => {
                let verb = match self.mode {
                    FormMode::Create => "created",
                    FormMode::Edit => "updated",
                };
                self.open = false;
                self.console.cache().invalidate_scope(S::RESOURCE.scope()).await;
                info!(resource = %S::RESOURCE, mode = %self.mode, "saved");
                self.console
                    .notifier()
                    .success(format!("{} {verb} successfully", S::RESOURCE.singular()));
                Ok(())
            }
            Err(e) => {
                let err = CoreError::from(e);
                if !matches!(err, CoreError::Unauthorized) {
                    self.console.notifier().error(err.user_message("Action failed"));
                }
                Err(err)
            }
        }
    }
}

impl<S: FormSchema> std::fmt::Debug for FormModal<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormModal")
            .field("resource", &S::RESOURCE)
            .field("open", &self.open)
            .field("mode", &self.mode)
            .field("values", &self.values)
            .field("slug_touched", &self.slug_touched)
            .finish_non_exhaustive()
    }
}
