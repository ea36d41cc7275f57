// Wire records and write payloads for the admin API.
//
// Records are what list/detail endpoints return. Payloads are what
// create/update endpoints accept; they carry only server-facing fields.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::de;

// ── Books ───────────────────────────────────────────────────────────

/// Contributor role of an author on a book.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AuthorRole {
    #[default]
    Author,
    Translator,
    Editor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(deserialize_with = "de::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "de::text")]
    pub title: String,
    #[serde(default, deserialize_with = "de::text")]
    pub slug: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub category_id: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub subcategory_id: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub subcategory_name: Option<String>,
    /// Comma-joined author names, as rendered by list endpoints.
    #[serde(default, deserialize_with = "de::opt_text")]
    pub author_names: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub short_description: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub long_description: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub meta_title: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub meta_description: Option<String>,
    /// Storage key of the downloadable file.
    #[serde(default, deserialize_with = "de::opt_text")]
    pub file_key: Option<String>,
    /// Storage key (or absolute URL) of the cover thumbnail.
    #[serde(default, deserialize_with = "de::opt_text")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_featured: bool,
    #[serde(default)]
    pub authors: Vec<BookAuthor>,
    #[serde(default)]
    pub specifications: Vec<BookSpecification>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub created_at: Option<String>,
}

/// Author association as returned by `GET /books/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookAuthor {
    #[serde(deserialize_with = "de::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "de::text")]
    pub name: String,
    #[serde(default, deserialize_with = "role_or_default")]
    pub role: AuthorRole,
}

fn role_or_default<'de, D: serde::Deserializer<'de>>(d: D) -> Result<AuthorRole, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw
        .and_then(|r| r.parse().ok())
        .unwrap_or_default())
}

/// Specification row. The detail endpoint names its columns
/// `spec_name`/`spec_value`; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSpecification {
    #[serde(default, alias = "spec_name", deserialize_with = "de::text")]
    pub name: String,
    #[serde(default, alias = "spec_value", deserialize_with = "de::text")]
    pub value: String,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub group: Option<String>,
    #[serde(default = "visible", deserialize_with = "de::flag_default_on")]
    pub is_visible: bool,
}

fn visible() -> bool {
    true
}

/// `POST /books` and `PUT /books/:id` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookPayload {
    pub title: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub category_id: Option<u64>,
    pub subcategory_id: Option<u64>,
    pub file_key: Option<String>,
    pub thumbnail: Option<String>,
    pub is_featured: u8,
    pub is_active: u8,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub authors: Vec<AuthorRef>,
    pub specifications: Vec<SpecificationPayload>,
}

/// Author association on a book payload: `{id, role}` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRef {
    pub id: u64,
    pub role: AuthorRole,
}

/// Specification on a book payload: `{name, value, group, is_visible}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecificationPayload {
    pub name: String,
    pub value: String,
    pub group: Option<String>,
    pub is_visible: u8,
}

// ── Authors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(deserialize_with = "de::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "de::text")]
    pub name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub slug: String,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub bio: Option<String>,
    /// Storage key (or absolute URL) of the portrait.
    #[serde(default, deserialize_with = "de::opt_text")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorPayload {
    pub name: String,
    pub slug: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub is_active: u8,
}

// ── Categories ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "de::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "de::text")]
    pub name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub slug: String,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPayload {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    #[serde(deserialize_with = "de::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "de::text")]
    pub name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub slug: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub category_id: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubcategoryPayload {
    pub name: String,
    pub slug: String,
    pub category_id: u64,
    pub is_active: u8,
}

// ── Users & settings ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "de::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "de::text")]
    pub full_name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub email: String,
    #[serde(default, deserialize_with = "de::text")]
    pub role: String,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPayload {
    pub full_name: String,
    pub email: String,
    /// Empty on update means "keep the current password".
    pub password: String,
    pub role: String,
    pub is_active: u8,
}

/// Key/value site setting. Identified by its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    #[serde(deserialize_with = "de::text")]
    pub setting_key: String,
    #[serde(default, deserialize_with = "de::text")]
    pub setting_value: String,
}

/// `PUT /settings` body. Used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingPayload {
    pub key: String,
    pub value: String,
}
