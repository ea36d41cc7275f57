// Create/edit modal flows against a wiremock admin API.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bookdesk_core::api::{AuthorRole, Category};
use bookdesk_core::{
    BookForm, CategoryForm, CategoryList, Console, ConsoleConfig, CoreError, FormMode, LocalFile,
    MemoryTokenStore, SettingForm, ToastLevel, UserForm,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Console) {
    let server = MockServer::start().await;
    let config = ConsoleConfig::new(&server.uri()).unwrap();
    let console = Console::new(config, Arc::new(MemoryTokenStore::with_token("tok-123"))).unwrap();
    (server, console)
}

fn category(value: serde_json::Value) -> Category {
    serde_json::from_value(value).unwrap()
}

async fn mount_book_options(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/admin/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categories": [{"id": 2, "name": "Fiction", "slug": "fiction"}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/authors"))
        .and(query_param("limit", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "name": "Ann Translator", "slug": "ann"}
        ])))
        .mount(server)
        .await;
}

async fn mount_emma(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/admin/books/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "title": "Emma",
            "slug": "emma",
            "category_id": 2,
            "file_key": "https://files.test/emma.pdf",
            "authors": [{"id": 3, "name": "Ann Translator", "role": "editor"}],
            "specifications": [{"spec_name": "Pages", "spec_value": "474"}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/subcategories"))
        .and(query_param("category_id", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 4, "name": "Classics", "slug": "classics", "category_id": 2}
        ])))
        .mount(server)
        .await;
}

// ── Categories ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_category_create_derives_slug_and_closes() {
    let (server, console) = setup().await;
    let mut toasts = console.notifier().subscribe();
    Mock::given(method("POST"))
        .and(path("/api/admin/categories"))
        .and(body_json(json!({
            "name": "Hello, World!",
            "slug": "hello-world",
            "description": null,
            "is_active": 1
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&server)
        .await;

    let mut form = console.form::<CategoryForm>();
    form.open_create().await;
    assert!(form.is_open());
    assert_eq!(form.mode(), FormMode::Create);

    form.set_text("name", "Hello, World!").unwrap();
    assert_eq!(form.values().text("slug"), "hello-world");
    assert!(!form.slug_touched());

    form.submit().await.unwrap();
    assert!(!form.is_open());
    let toast = toasts.try_recv().unwrap();
    assert_eq!(toast.level, ToastLevel::Success);
    assert_eq!(toast.message, "Category created successfully");
}

#[tokio::test]
async fn test_manual_slug_stops_derivation() {
    let (_server, console) = setup().await;
    let mut form = console.form::<CategoryForm>();
    form.open_create().await;

    form.set_text("name", "Poetry").unwrap();
    form.set_text("slug", "verse").unwrap();
    form.set_text("name", "Modern Poetry").unwrap();

    assert!(form.slug_touched());
    assert_eq!(form.values().text("slug"), "verse");
}

#[tokio::test]
async fn test_reopening_in_create_mode_resumes_derivation() {
    let (_server, console) = setup().await;
    let mut form = console.form::<CategoryForm>();
    form.open_create().await;
    form.set_text("slug", "verse").unwrap();
    form.close();

    form.open_create().await;
    assert!(!form.slug_touched());
    assert_eq!(form.values().text("slug"), "");

    form.set_text("name", "Modern Poetry").unwrap();
    assert_eq!(form.values().text("slug"), "modern-poetry");
}

#[tokio::test]
async fn test_edit_keeps_existing_slug() {
    let (server, console) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/categories/7"))
        .and(body_partial_json(json!({"name": "Ada Lovelace", "slug": "ada-x", "is_active": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut form = console.form::<CategoryForm>();
    form.open_edit(category(json!({"id": 7, "name": "Ada", "slug": "ada-x", "is_active": false})))
        .await;
    assert_eq!(form.mode(), FormMode::Edit);
    assert!(!form.values().flag("is_active"));

    form.set_text("name", "Ada Lovelace").unwrap();
    assert_eq!(form.values().text("slug"), "ada-x");
    form.submit().await.unwrap();
}

#[tokio::test]
async fn test_submit_refetches_mounted_lists() {
    let (server, console) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 9, "name": "Drama", "slug": "drama", "is_active": 1}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/categories"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .mount(&server)
        .await;

    let mut list = console.list::<CategoryList>();
    assert!(list.load().await.rows.is_empty());

    let mut form = console.form::<CategoryForm>();
    form.open_create().await;
    form.set_text("name", "Drama").unwrap();
    form.submit().await.unwrap();

    let view = list.view();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].name, "Drama");
}

#[tokio::test]
async fn test_server_rejection_keeps_modal_open() {
    let (server, console) = setup().await;
    let mut toasts = console.notifier().subscribe();
    Mock::given(method("POST"))
        .and(path("/api/admin/categories"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"error": "Slug already taken"})))
        .mount(&server)
        .await;

    let mut form = console.form::<CategoryForm>();
    form.open_create().await;
    form.set_text("name", "Drama").unwrap();
    let err = form.submit().await.unwrap_err();

    assert!(matches!(err, CoreError::Api { status: Some(422), .. }));
    assert!(form.is_open());
    assert_eq!(form.values().text("name"), "Drama");
    let toast = toasts.try_recv().unwrap();
    assert_eq!(toast.level, ToastLevel::Error);
    assert_eq!(toast.message, "Slug already taken");
}

#[tokio::test]
async fn test_validation_failure_sends_nothing() {
    let (server, console) = setup().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut form = console.form::<CategoryForm>();
    form.open_create().await;
    let err = form.submit().await.unwrap_err();

    assert_eq!(err.field_errors().unwrap()["name"], "Name is required");
    assert_eq!(form.errors()["name"], "Name is required");
    assert!(form.is_open());
}

// ── Users & settings ────────────────────────────────────────────────

#[tokio::test]
async fn test_user_create_checks_email_and_password() {
    let (_server, console) = setup().await;
    let mut form = console.form::<UserForm>();
    form.open_create().await;
    form.set_text("full_name", "Ada").unwrap();
    form.set_text("email", "ada@").unwrap();
    form.set_text("password", "abc").unwrap();

    let err = form.submit().await.unwrap_err();
    let errors = err.field_errors().unwrap();
    assert_eq!(errors["email"], "Please enter a valid email address");
    assert_eq!(errors["password"], "Password must be at least 6 characters");
}

#[tokio::test]
async fn test_setting_key_is_locked_on_edit() {
    let (server, console) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/settings"))
        .and(body_json(json!({"key": "site_name", "value": "Bookdesk"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut form = console.form::<SettingForm>();
    form.open_edit(serde_json::from_value(json!({"setting_key": "site_name", "setting_value": "Old"})).unwrap())
        .await;
    assert!(form.set_text("key", "other").is_err());
    form.set_text("value", "Bookdesk").unwrap();
    form.submit().await.unwrap();
}

// ── Books ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_book_upload_then_submit_sends_key_and_authors() {
    let (server, console) = setup().await;
    let mut toasts = console.notifier().subscribe();
    mount_book_options(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/admin/storage/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "books/abc.pdf"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/storage/url"))
        .and(query_param("key", "books/abc.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": "https://cdn.test/abc.pdf"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/books"))
        .and(body_partial_json(json!({
            "title": "Dune",
            "slug": "dune",
            "file_key": "books/abc.pdf",
            "thumbnail": null,
            "meta_title": "Meta Title",
            "authors": [{"id": 3, "role": "translator"}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let mut form = console.form::<BookForm>();
    form.open_create().await;
    assert_eq!(form.extras().categories.len(), 1);
    assert_eq!(form.extras().authors.options().len(), 1);

    form.set_text("title", "Dune").unwrap();
    assert!(form.extras_mut().authors.select(3, AuthorRole::Translator));
    form.upload("file_key", LocalFile::new("dune.pdf", "application/pdf", b"%PDF".to_vec()))
        .await
        .unwrap();

    let slot = form.uploads().get("file_key").unwrap();
    assert_eq!(slot.key(), Some("books/abc.pdf"));
    assert_eq!(slot.preview(), Some("https://cdn.test/abc.pdf"));
    assert_eq!(toasts.try_recv().unwrap().message, "File uploaded");

    form.submit().await.unwrap();
    assert_eq!(toasts.try_recv().unwrap().message, "Book created successfully");
}

#[tokio::test]
async fn test_submit_waits_for_uploads() {
    let (server, console) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/books"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut form = console.form::<BookForm>();
    form.open_create().await;
    form.set_text("title", "Dune").unwrap();
    form.select_file("thumbnail", LocalFile::new("cover.png", "image/png", vec![0_u8; 4]))
        .unwrap();

    assert!(form.is_uploading());
    assert!(matches!(form.submit().await, Err(CoreError::UploadInProgress)));
    assert!(form.is_open());
}

#[tokio::test]
async fn test_unresolvable_upload_keeps_key() {
    let (server, console) = setup().await;
    let mut toasts = console.notifier().subscribe();
    Mock::given(method("POST"))
        .and(path("/api/admin/storage/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "thumbnails/c.png"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/storage/url"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut form = console.form::<BookForm>();
    form.open_create().await;
    form.upload("thumbnail", LocalFile::new("c.png", "image/png", vec![1_u8]))
        .await
        .unwrap();

    let slot = form.uploads().get("thumbnail").unwrap();
    assert_eq!(slot.key(), Some("thumbnails/c.png"));
    assert_eq!(slot.preview(), None);
    let toast = toasts.try_recv().unwrap();
    assert_eq!(toast.level, ToastLevel::Error);
    assert_eq!(toast.message, "Failed to upload thumbnail");
}

#[tokio::test]
async fn test_book_edit_hydrates_from_detail() {
    let (server, console) = setup().await;
    mount_book_options(&server).await;
    mount_emma(&server).await;

    let mut form = console.form::<BookForm>();
    let row = serde_json::from_value(json!({"id": 5, "title": "Emma"})).unwrap();
    form.open_edit(row).await;

    assert_eq!(form.values().text("category_id"), "2");
    assert_eq!(form.extras().subcategories.len(), 1);
    assert_eq!(form.extras().authors.selected()[0].role, AuthorRole::Editor);
    assert_eq!(form.extras().specifications.rows().len(), 1);
    assert_eq!(
        form.uploads().get("file_key").unwrap().preview(),
        Some("https://files.test/emma.pdf")
    );

    let payload = form.payload();
    assert_eq!(payload.meta_title, None);
    assert_eq!(payload.file_key.as_deref(), Some("https://files.test/emma.pdf"));
}

#[tokio::test]
async fn test_create_after_edit_starts_from_nothing() {
    let (server, console) = setup().await;
    mount_book_options(&server).await;
    mount_emma(&server).await;

    let mut form = console.form::<BookForm>();
    let row = serde_json::from_value(json!({"id": 5, "title": "Emma"})).unwrap();
    form.open_edit(row).await;
    assert_eq!(form.extras().authors.selected().len(), 1);
    form.close();

    form.open_create().await;
    assert_eq!(form.mode(), FormMode::Create);
    assert!(form.record().is_none());
    assert_eq!(form.values().text("title"), "");
    assert!(form.extras().authors.selected().is_empty());
    assert!(form.extras().specifications.rows().is_empty());
    assert_eq!(form.uploads().key("file_key"), None);
    assert_eq!(form.uploads().key("thumbnail"), None);
    assert_eq!(form.uploads().get("file_key").unwrap().preview(), None);

    let payload = form.payload();
    assert!(payload.authors.is_empty());
    assert!(payload.specifications.is_empty());
    assert_eq!(payload.file_key, None);
}
