// Integration tests for `AdminClient` using wiremock.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bookdesk_api::{
    AdminClient, AuthHandler, AuthorRef, AuthorRole, BookPayload, Error, ListParams, MetricKind,
    MetricPeriod, SettingPayload, SpecificationPayload, StorageCategory, UploadFile,
};

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Default)]
struct CountingAuth {
    token: Option<String>,
    unauthorized: AtomicUsize,
}

impl AuthHandler for CountingAuth {
    fn token(&self) -> Option<SecretString> {
        self.token.clone().map(SecretString::from)
    }

    fn unauthorized(&self) {
        self.unauthorized.fetch_add(1, Ordering::SeqCst);
    }
}

async fn setup_with(token: Option<&str>) -> (MockServer, AdminClient, Arc<CountingAuth>) {
    let server = MockServer::start().await;
    let auth = Arc::new(CountingAuth {
        token: token.map(String::from),
        ..CountingAuth::default()
    });
    let client = AdminClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        auth.clone(),
    );
    (server, client, auth)
}

async fn setup() -> (MockServer, AdminClient, Arc<CountingAuth>) {
    setup_with(Some("tok-123")).await
}

// ── Auth plumbing ───────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_attached() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let users = client.list_users().await.unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_401_fires_logout_hook_once() {
    let (server, client, auth) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "expired"})))
        .mount(&server)
        .await;

    let err = client
        .list_books(&ListParams::page(1, 20))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.server_message().as_deref(), Some("expired"));
    assert_eq!(auth.unauthorized.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_login_does_not_fire_logout_hook() {
    let (server, client, auth) = setup_with(None).await;

    Mock::given(method("POST"))
        .and(path("/api/admin/login"))
        .and(body_json(json!({"email": "ada@example.com", "password": "wrong-pw"})))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let err = client
        .login("ada@example.com", &SecretString::from("wrong-pw".to_owned()))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(auth.unauthorized.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_login_returns_token_and_user() {
    let (server, client, _) = setup_with(None).await;

    Mock::given(method("POST"))
        .and(path("/api/admin/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc", "name": "Ada", "role": "admin"
        })))
        .mount(&server)
        .await;

    let resp = client
        .login("ada@example.com", &SecretString::from("secret1".to_owned()))
        .await
        .unwrap();
    assert_eq!(resp.name, "Ada");
    assert_eq!(resp.role, "admin");
}

#[tokio::test]
async fn test_non_2xx_is_http_error() {
    let (server, client, auth) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/admin/categories/4"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"error": "Category has books"})),
        )
        .mount(&server)
        .await;

    let err = client.delete_category(4).await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 409, .. }));
    assert_eq!(err.server_message().as_deref(), Some("Category has books"));
    assert_eq!(auth.unauthorized.load(Ordering::SeqCst), 0);
}

// ── List normalization ──────────────────────────────────────────────

#[tokio::test]
async fn test_list_books_sends_params_and_reads_totals() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "20"))
        .and(query_param("q", "dune"))
        .and(query_param("category_id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": 7, "title": "Dune", "slug": "dune", "is_active": 1}],
            "total": 21,
            "totalPages": 2
        })))
        .mount(&server)
        .await;

    let params = ListParams {
        q: Some("dune".into()),
        ..ListParams::page(2, 20)
    }
    .with_filter("category_id", 3);
    let page = client.list_books(&params).await.unwrap();

    assert_eq!(page.items[0].title, "Dune");
    assert_eq!(page.total, Some(21));
    assert_eq!(page.total_pages, Some(2));
}

#[tokio::test]
async fn test_categories_envelope() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categories": [{"id": "1", "name": "Fiction", "slug": "fiction", "is_active": "1"}]
        })))
        .mount(&server)
        .await;

    let page = client
        .list_categories(&ListParams::page(1, 20))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.items[0].id, 1);
    assert!(page.items[0].is_active);
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_book_payload_shape() {
    let (server, client, _) = setup().await;

    let payload = BookPayload {
        title: "Dune".into(),
        slug: "dune".into(),
        short_description: None,
        long_description: None,
        category_id: Some(2),
        subcategory_id: None,
        file_key: Some("books/abc.pdf".into()),
        thumbnail: None,
        is_featured: 0,
        is_active: 1,
        meta_title: Some("Meta Title".into()),
        meta_description: Some("Meta Description".into()),
        authors: vec![AuthorRef {
            id: 3,
            role: AuthorRole::Translator,
        }],
        specifications: vec![SpecificationPayload {
            name: "Pages".into(),
            value: "320".into(),
            group: None,
            is_visible: 1,
        }],
    };

    Mock::given(method("POST"))
        .and(path("/api/admin/books"))
        .and(body_json(json!({
            "title": "Dune",
            "slug": "dune",
            "short_description": null,
            "long_description": null,
            "category_id": 2,
            "subcategory_id": null,
            "file_key": "books/abc.pdf",
            "thumbnail": null,
            "is_featured": 0,
            "is_active": 1,
            "meta_title": "Meta Title",
            "meta_description": "Meta Description",
            "authors": [{"id": 3, "role": "translator"}],
            "specifications": [{"name": "Pages", "value": "320", "group": null, "is_visible": 1}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 10})))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create_book(&payload).await.unwrap();
    assert_eq!(created["id"], 10);
}

#[tokio::test]
async fn test_delete_book_with_file() {
    let (server, client, _) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/admin/books/9"))
        .and(query_param("delete_file", "1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_book(9, true).await.unwrap();
}

#[tokio::test]
async fn test_settings_put_and_delete_by_key() {
    let (server, client, _) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/admin/settings"))
        .and(body_json(json!({"key": "site_name", "value": "Bookdesk"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/settings"))
        .and(query_param("key", "site_name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .put_setting(&SettingPayload {
            key: "site_name".into(),
            value: "Bookdesk".into(),
        })
        .await
        .unwrap();
    client.delete_setting("site_name").await.unwrap();
}

// ── Storage ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_multipart_upload_returns_key() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/storage/upload"))
        .and(body_string_contains("name=\"type\""))
        .and(body_string_contains("thumbnails"))
        .and(body_string_contains("filename=\"cover.png\""))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"key": "thumbnails/cover.png"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let file = UploadFile::new("cover.png", b"\x89PNG fake".to_vec()).with_mime("image/png");
    let key = client
        .upload(&file, StorageCategory::Thumbnails, None)
        .await
        .unwrap();
    assert_eq!(key, "thumbnails/cover.png");
}

#[tokio::test]
async fn test_storage_url_lookup() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/storage/url"))
        .and(query_param("key", "books/abc.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"url": "https://cdn.example.com/abc.pdf?sig=1"})),
        )
        .mount(&server)
        .await;

    let url = client.storage_url("books/abc.pdf").await.unwrap();
    assert_eq!(url, "https://cdn.example.com/abc.pdf?sig=1");
}

// ── Stats ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_metric_sends_type_and_period() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/stats/metrics"))
        .and(query_param("type", "downloads"))
        .and(query_param("period", "7d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"type": "downloads", "count": 31}]
        })))
        .mount(&server)
        .await;

    let count = client
        .metric(MetricKind::Downloads, MetricPeriod::Week)
        .await
        .unwrap();
    assert_eq!(count, 31);
}

#[tokio::test]
async fn test_overview_points() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/stats/overview"))
        .and(query_param("days", "14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"date": "2026-10-01", "views": "5", "downloads": 1},
                {"views": 8, "downloads": null}
            ]
        })))
        .mount(&server)
        .await;

    let overview = client.overview(14).await.unwrap();
    assert_eq!(overview.items.len(), 2);
    assert_eq!(overview.items[0].views, 5);
    assert_eq!(overview.items[1].downloads, 0);
    assert_eq!(overview.items[1].date, None);
}
