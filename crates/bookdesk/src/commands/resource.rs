//! List, show, save and delete, shared by every record-backed command.
//!
//! Each resource plugs in through [`CliResource`]: how a record renders as
//! a table row and as a detail view, and how one record is looked up. The
//! flows themselves drive the console's list and form controllers.

use std::future::Future;
use std::path::PathBuf;

use bytesize::ByteSize;
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use bookdesk_core::{
    Console, DeleteOptions, FieldKind, FormModal, FormSchema, ListDisplay, ListResource, LocalFile,
};

use super::util;
use crate::cli::{GlobalOpts, ListArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Resource plumbing ───────────────────────────────────────────────

pub trait CliResource: ListResource<Item: Serialize> + Sized {
    type Form: CliForm<Record = Self::Item>;
    type Row: Tabled;

    fn row(item: &Self::Item) -> Self::Row;

    fn detail(item: &Self::Item) -> String;

    /// Load one record by its key.
    fn fetch_one(
        console: &Console,
        key: &str,
    ) -> impl Future<Output = Result<Self::Item, CliError>> + Send {
        find_in_list::<Self>(console, key)
    }
}

/// Form hooks for `--from-file` entries that are not plain fields.
pub trait CliForm: FormSchema + Sized {
    /// Returns `false` when `name` means nothing to this form.
    fn apply_json_extra(
        _form: &mut FormModal<Self>,
        _name: &str,
        _value: &Value,
    ) -> Result<bool, CliError> {
        Ok(false)
    }
}

/// Look a record up on the first (or only) page of its list.
pub async fn find_in_list<R: CliResource>(console: &Console, key: &str) -> Result<R::Item, CliError> {
    let mut list = console.list::<R>();
    list.load().await;
    if let Some(err) = list.error() {
        return Err(err.into());
    }
    list.find(key).ok_or_else(|| util::not_found(R::RESOURCE, key))
}

// ── List ────────────────────────────────────────────────────────────

pub async fn list<R: CliResource>(
    console: &Console,
    args: &ListArgs,
    filters: &[(&str, String)],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut list = console.list::<R>();

    // Every filter change goes back to page 1, so the page is set last.
    if let Some(limit) = args.limit {
        list.set_limit(limit);
    }
    for (name, value) in filters {
        list.set_filter(name, value);
    }
    if let Some(ref q) = args.query {
        list.set_query(q);
    }
    if let Some(active) = args.active {
        list.set_active(active.into());
    }
    if let Some(page) = args.page {
        list.set_page(page);
    }
    tracing::debug!(href = %console.history().current().href(), "listing");

    let view = list.load().await;
    if let Some(err) = list.error() {
        return Err(err.into());
    }

    let out = output::render_list(global.output, &view.rows, R::row, R::item_key)?;
    if global.output != OutputFormat::Table {
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    match view.display {
        ListDisplay::Empty { searching: true } => {
            output::status(global, &format!("No {} match the current filters", R::RESOURCE));
        }
        ListDisplay::Empty { searching: false } => {
            output::status(global, &format!("No {} yet", R::RESOURCE));
        }
        ListDisplay::Rows | ListDisplay::Loading => output::print_output(&out, global.quiet),
    }
    if R::PAGINATED && view.fetched > 0 {
        let mut footer = format!("Page {} of {}", view.page, view.total_pages.max(1));
        if let Some(total) = view.total {
            footer.push_str(&format!(", {total} total"));
        }
        if view.can_next {
            footer.push_str(&format!("; next: --page {}", view.page + 1));
        }
        output::status(global, &footer);
    }
    Ok(())
}

// ── Get ─────────────────────────────────────────────────────────────

pub async fn get<R: CliResource>(console: &Console, key: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let item = R::fetch_one(console, key).await?;
    let out = output::render_single(global.output, &item, R::detail, R::item_key)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Create / update ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Text(String),
    Flag(bool),
}

/// Everything a create/update command was given, by form field name.
#[derive(Debug, Default)]
pub struct FormInput {
    pub from_file: Option<PathBuf>,
    pub fields: Vec<(&'static str, FieldInput)>,
    pub uploads: Vec<(&'static str, PathBuf)>,
    pub cleared_uploads: Vec<&'static str>,
}

impl FormInput {
    pub fn new(from_file: Option<PathBuf>) -> Self {
        Self {
            from_file,
            ..Self::default()
        }
    }

    pub fn text(mut self, name: &'static str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.fields.push((name, FieldInput::Text(value)));
        }
        self
    }

    pub fn id(self, name: &'static str, value: Option<u64>) -> Self {
        self.text(name, value.map(|id| id.to_string()))
    }

    pub fn flag(mut self, name: &'static str, value: Option<bool>) -> Self {
        if let Some(value) = value {
            self.fields.push((name, FieldInput::Flag(value)));
        }
        self
    }

    pub fn upload(mut self, name: &'static str, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.uploads.push((name, path));
        }
        self
    }

    pub fn clear_upload(mut self, name: &'static str, clear: bool) -> Self {
        if clear {
            self.cleared_uploads.push(name);
        }
        self
    }
}

fn apply_field<S: CliForm>(form: &mut FormModal<S>, name: &str, value: FieldInput) -> Result<(), CliError> {
    match value {
        FieldInput::Text(text) => form.set_text(name, text)?,
        FieldInput::Flag(flag) => form.set_flag(name, flag)?,
    }
    Ok(())
}

/// Convert a JSON value to the input its field expects.
fn json_input(kind: Option<FieldKind>, name: &str, value: &Value) -> Result<FieldInput, CliError> {
    let invalid = |expected: &str| CliError::Validation {
        field: name.into(),
        reason: format!("expected {expected} in --from-file, got {value}"),
    };
    match (kind, value) {
        (Some(FieldKind::Flag { .. }), Value::Bool(flag)) => Ok(FieldInput::Flag(*flag)),
        (Some(FieldKind::Flag { .. }), Value::Number(n)) => Ok(FieldInput::Flag(n.as_u64() != Some(0))),
        (Some(FieldKind::Flag { .. }), _) => Err(invalid("true or false")),
        (_, Value::String(text)) => Ok(FieldInput::Text(text.clone())),
        (_, Value::Number(n)) => Ok(FieldInput::Text(n.to_string())),
        (_, Value::Null) => Ok(FieldInput::Text(String::new())),
        _ => Err(invalid("a string or number")),
    }
}

fn apply_json<S: CliForm>(form: &mut FormModal<S>, json: &Value) -> Result<(), CliError> {
    let Value::Object(entries) = json else {
        return Err(CliError::Validation {
            field: "from-file".into(),
            reason: "expected a JSON object of form fields".into(),
        });
    };
    for (name, value) in entries {
        if S::apply_json_extra(form, name, value)? {
            continue;
        }
        let kind = S::FIELDS.iter().find(|f| f.name == name).map(|f| f.kind);
        apply_field(form, name, json_input(kind, name, value)?)?;
    }
    Ok(())
}

/// Open the form (on `key`'s record, or empty), apply the input, upload
/// any files and submit.
pub async fn save<R: CliResource>(
    console: &Console,
    key: Option<&str>,
    input: FormInput,
    global: &GlobalOpts,
    extras: impl FnOnce(&mut FormModal<R::Form>) -> Result<(), CliError>,
) -> Result<(), CliError> {
    let mut form = console.form::<R::Form>();
    match key {
        Some(key) => {
            let record = R::fetch_one(console, key).await?;
            form.open_edit(record).await;
        }
        None => form.open_create().await,
    }

    if let Some(ref path) = input.from_file {
        apply_json(&mut form, &util::read_json_file(path)?)?;
    }
    for (name, value) in input.fields {
        apply_field(&mut form, name, value)?;
    }
    extras(&mut form)?;

    for name in input.cleared_uploads {
        form.remove_upload(name)?;
    }
    for (name, path) in input.uploads {
        let file = LocalFile::from_path(&path)?;
        let size = ByteSize(u64::try_from(file.bytes.len()).unwrap_or(u64::MAX));
        let pb = util::spinner(global, format!("Uploading {} ({size})", file.name));
        let uploaded = form.upload(name, file).await;
        pb.finish_and_clear();
        uploaded?;
    }

    let pb = util::spinner(global, format!("Saving {}", R::RESOURCE.singular().to_lowercase()));
    let saved = form.submit().await;
    pb.finish_and_clear();
    saved.map_err(CliError::from)
}

// ── Delete ──────────────────────────────────────────────────────────

pub async fn delete<R: CliResource>(
    console: &Console,
    key: &str,
    options: DeleteOptions,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let item = R::fetch_one(console, key).await?;
    let noun = R::RESOURCE.singular().to_lowercase();
    if !util::confirm(&format!("Delete {noun} '{}'?", R::label(&item)), global)? {
        output::status(global, "Aborted");
        return Ok(());
    }

    let mut list = console.list::<R>();
    list.request_delete(item);
    list.confirm_delete(options).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_values_follow_the_field_kind() {
        let flag = Some(FieldKind::Flag { default: true });
        assert_eq!(
            json_input(flag, "is_active", &json!(0)).unwrap(),
            FieldInput::Flag(false)
        );
        assert_eq!(
            json_input(flag, "is_active", &json!(true)).unwrap(),
            FieldInput::Flag(true)
        );
        assert!(json_input(flag, "is_active", &json!("yes")).is_err());

        assert_eq!(
            json_input(Some(FieldKind::Select), "category_id", &json!(4)).unwrap(),
            FieldInput::Text("4".into())
        );
        assert_eq!(
            json_input(Some(FieldKind::Text), "slug", &Value::Null).unwrap(),
            FieldInput::Text(String::new())
        );
        assert!(json_input(None, "tags", &json!(["a"])).is_err());
    }

    #[test]
    fn form_input_skips_absent_flags() {
        let input = FormInput::new(None)
            .text("name", Some("Sci-Fi".into()))
            .text("slug", None)
            .id("category_id", Some(4))
            .flag("is_active", None)
            .clear_upload("image", false);
        assert_eq!(
            input.fields,
            vec![
                ("name", FieldInput::Text("Sci-Fi".into())),
                ("category_id", FieldInput::Text("4".into())),
            ]
        );
        assert!(input.cleared_uploads.is_empty());
    }
}
