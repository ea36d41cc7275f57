// Form schemas for the flat resources.

use bookdesk_api::{
    AdminClient, Author, AuthorPayload, Category, CategoryPayload, ListParams, Setting,
    SettingPayload, StorageCategory, Subcategory, SubcategoryPayload, User, UserPayload,
};
use serde_json::Value;
use tracing::warn;

use super::{
    FieldDescriptor, FieldKind, FormMode, FormSchema, FormValues, SlugRule, UploadField, Uploads,
    slugify,
};
use crate::resource::Resource;

const NAME_SLUG: Option<SlugRule> = Some(SlugRule {
    source: "name",
    target: "slug",
});

/// The slug as typed, or one derived from `source`.
fn slug_or_derived(values: &FormValues, source: &str) -> String {
    values
        .opt_text("slug")
        .unwrap_or_else(|| slugify(values.text(source)))
}

// ── Categories ──────────────────────────────────────────────────────

pub struct CategoryForm;

impl FormSchema for CategoryForm {
    type Record = Category;
    type Extras = ();
    type Payload = CategoryPayload;

    const RESOURCE: Resource = Resource::Categories;
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::text("name", "Name").required(),
        FieldDescriptor::text("slug", "Slug"),
        FieldDescriptor::long_text("description", "Description"),
        FieldDescriptor::flag("is_active", "Active", true),
    ];
    const SLUG: Option<SlugRule> = NAME_SLUG;

    fn values(record: &Category) -> FormValues {
        FormValues::defaults(Self::FIELDS)
            .with_text("name", record.name.clone())
            .with_text("slug", record.slug.clone())
            .with_text("description", record.description.clone().unwrap_or_default())
            .with_flag("is_active", record.is_active)
    }

    fn payload(values: &FormValues, _: &(), _: &Uploads, _: FormMode) -> CategoryPayload {
        CategoryPayload {
            name: values.text("name").to_owned(),
            slug: slug_or_derived(values, "name"),
            description: values.opt_text("description"),
            is_active: values.bit("is_active"),
        }
    }

    async fn create(client: &AdminClient, payload: &CategoryPayload) -> Result<Value, bookdesk_api::Error> {
        client.create_category(payload).await
    }

    async fn update(
        client: &AdminClient,
        record: &Category,
        payload: &CategoryPayload,
    ) -> Result<Value, bookdesk_api::Error> {
        client.update_category(record.id, payload).await
    }
}

// ── Subcategories ───────────────────────────────────────────────────

pub struct SubcategoryForm;

impl FormSchema for SubcategoryForm {
    type Record = Subcategory;
    /// Parent category options.
    type Extras = Vec<Category>;
    type Payload = SubcategoryPayload;

    const RESOURCE: Resource = Resource::Subcategories;
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::text("name", "Name").required(),
        FieldDescriptor::text("slug", "Slug"),
        FieldDescriptor::select("category_id", "Category").required(),
        FieldDescriptor::flag("is_active", "Active", true),
    ];
    const SLUG: Option<SlugRule> = NAME_SLUG;

    fn values(record: &Subcategory) -> FormValues {
        FormValues::defaults(Self::FIELDS)
            .with_text("name", record.name.clone())
            .with_text("slug", record.slug.clone())
            .with_text(
                "category_id",
                record.category_id.map(|id| id.to_string()).unwrap_or_default(),
            )
            .with_flag("is_active", record.is_active)
    }

    fn payload(values: &FormValues, _: &Vec<Category>, _: &Uploads, _: FormMode) -> SubcategoryPayload {
        SubcategoryPayload {
            name: values.text("name").to_owned(),
            slug: slug_or_derived(values, "name"),
            // Required and numeric-checked before this is called.
            category_id: values.id("category_id").unwrap_or_default(),
            is_active: values.bit("is_active"),
        }
    }

    async fn prepare(client: &AdminClient, _: &FormValues, extras: &mut Vec<Category>) {
        match client.list_categories(&ListParams::default()).await {
            Ok(list) => *extras = list.items,
            Err(e) => warn!(error = %e, "could not load category options"),
        }
    }

    async fn create(client: &AdminClient, payload: &SubcategoryPayload) -> Result<Value, bookdesk_api::Error> {
        client.create_subcategory(payload).await
    }

    async fn update(
        client: &AdminClient,
        record: &Subcategory,
        payload: &SubcategoryPayload,
    ) -> Result<Value, bookdesk_api::Error> {
        client.update_subcategory(record.id, payload).await
    }
}

// ── Authors ─────────────────────────────────────────────────────────

pub struct AuthorForm;

impl FormSchema for AuthorForm {
    type Record = Author;
    type Extras = ();
    type Payload = AuthorPayload;

    const RESOURCE: Resource = Resource::Authors;
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::text("name", "Name").required(),
        FieldDescriptor::text("slug", "Slug"),
        FieldDescriptor::long_text("bio", "Bio"),
        FieldDescriptor::flag("is_active", "Active", true),
    ];
    const SLUG: Option<SlugRule> = NAME_SLUG;
    const UPLOADS: &'static [UploadField] = &[UploadField {
        name: "image",
        category: StorageCategory::Thumbnails,
        success: "Image uploaded successfully",
        failure: "Failed to upload image",
    }];

    fn values(record: &Author) -> FormValues {
        FormValues::defaults(Self::FIELDS)
            .with_text("name", record.name.clone())
            .with_text("slug", record.slug.clone())
            .with_text("bio", record.bio.clone().unwrap_or_default())
            .with_flag("is_active", record.is_active)
    }

    fn upload_keys(record: &Author) -> Vec<(&'static str, Option<String>)> {
        vec![("image", record.image.clone())]
    }

    fn payload(values: &FormValues, _: &(), uploads: &Uploads, _: FormMode) -> AuthorPayload {
        AuthorPayload {
            name: values.text("name").to_owned(),
            slug: slug_or_derived(values, "name"),
            bio: values.opt_text("bio"),
            image: uploads.key("image"),
            is_active: values.bit("is_active"),
        }
    }

    async fn create(client: &AdminClient, payload: &AuthorPayload) -> Result<Value, bookdesk_api::Error> {
        client.create_author(payload).await
    }

    async fn update(
        client: &AdminClient,
        record: &Author,
        payload: &AuthorPayload,
    ) -> Result<Value, bookdesk_api::Error> {
        client.update_author(record.id, payload).await
    }
}

// ── Users ───────────────────────────────────────────────────────────

pub struct UserForm;

impl FormSchema for UserForm {
    type Record = User;
    type Extras = ();
    type Payload = UserPayload;

    const RESOURCE: Resource = Resource::Users;
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::text("full_name", "Full name").required(),
        FieldDescriptor::new("email", "Email", FieldKind::Email).required(),
        FieldDescriptor::new("password", "Password", FieldKind::Password)
            .min_len_on_create(super::MIN_PASSWORD_LEN),
        FieldDescriptor::text("role", "Role").default_text("employee"),
        FieldDescriptor::flag("is_active", "Active", true),
    ];

    /// The password is never returned; editing leaves it blank.
    fn values(record: &User) -> FormValues {
        let role = if record.role.is_empty() {
            "employee"
        } else {
            record.role.as_str()
        };
        FormValues::defaults(Self::FIELDS)
            .with_text("full_name", record.full_name.clone())
            .with_text("email", record.email.clone())
            .with_text("role", role)
            .with_flag("is_active", record.is_active)
    }

    fn payload(values: &FormValues, _: &(), _: &Uploads, _: FormMode) -> UserPayload {
        UserPayload {
            full_name: values.text("full_name").to_owned(),
            email: values.text("email").trim().to_owned(),
            password: values.text("password").to_owned(),
            role: values
                .opt_text("role")
                .unwrap_or_else(|| "employee".to_owned()),
            is_active: values.bit("is_active"),
        }
    }

    async fn create(client: &AdminClient, payload: &UserPayload) -> Result<Value, bookdesk_api::Error> {
        client.create_user(payload).await
    }

    async fn update(client: &AdminClient, record: &User, payload: &UserPayload) -> Result<Value, bookdesk_api::Error> {
        client.update_user(record.id, payload).await
    }
}

// ── Settings ────────────────────────────────────────────────────────

pub struct SettingForm;

impl FormSchema for SettingForm {
    type Record = Setting;
    type Extras = ();
    type Payload = SettingPayload;

    const RESOURCE: Resource = Resource::Settings;
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::text("key", "Key").required().locked_on_edit(),
        FieldDescriptor::long_text("value", "Value").required(),
    ];

    fn values(record: &Setting) -> FormValues {
        FormValues::defaults(Self::FIELDS)
            .with_text("key", record.setting_key.clone())
            .with_text("value", record.setting_value.clone())
    }

    fn payload(values: &FormValues, _: &(), _: &Uploads, _: FormMode) -> SettingPayload {
        SettingPayload {
            key: values.text("key").trim().to_owned(),
            value: values.text("value").to_owned(),
        }
    }

    // Settings are upserted by key; create and update are the same call.
    async fn create(client: &AdminClient, payload: &SettingPayload) -> Result<Value, bookdesk_api::Error> {
        client.put_setting(payload).await
    }

    async fn update(
        client: &AdminClient,
        _: &Setting,
        payload: &SettingPayload,
    ) -> Result<Value, bookdesk_api::Error> {
        client.put_setting(payload).await
    }
}
