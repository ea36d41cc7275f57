// List-screen flows against a wiremock admin API.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use secrecy::SecretString;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bookdesk_core::{
    ActiveFilter, BookList, CategoryList, Console, ConsoleConfig, DeleteOptions, ListDisplay, MemoryTokenStore,
    Resource, Route, SettingList, ToastLevel,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Console) {
    let server = MockServer::start().await;
    let config = ConsoleConfig::new(&server.uri()).unwrap();
    let console = Console::new(config, Arc::new(MemoryTokenStore::with_token("tok-123"))).unwrap();
    (server, console)
}

fn book(id: u64, title: &str, active: bool) -> Value {
    json!({
        "id": id,
        "title": title,
        "slug": title.to_lowercase(),
        "author_names": "Frank Herbert",
        "is_active": u8::from(active),
    })
}

async fn mount_books(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ── Mounting & pagination ───────────────────────────────────────────

#[tokio::test]
async fn test_mount_fills_in_defaults_without_a_history_entry() {
    let (server, console) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "20"))
        .and(header("Authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [book(1, "Dune", true)],
            "total": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let before = console.history().len();
    let mut list = console.list::<BookList>();
    // Navigating to the list pushed one entry; the defaults replaced it.
    assert_eq!(console.history().len(), before + 1);
    assert_eq!(console.history().current().href(), "/dashboard/books?limit=20&page=1");

    let view = list.load().await;
    assert_eq!(view.display, ListDisplay::Rows);
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.page_buttons, vec![1]);
    assert!(!view.can_prev);
    assert!(!view.can_next);
}

#[tokio::test]
async fn test_previous_never_goes_below_one() {
    let (server, console) = setup().await;
    mount_books(&server, json!([book(1, "Dune", true)])).await;

    let mut list = console.list::<BookList>();
    list.load().await;
    list.prev();
    assert_eq!(list.state().page, 1);
    assert_eq!(console.history().current().get("page"), Some("1"));
}

#[tokio::test]
async fn test_next_needs_a_full_page() {
    let (server, console) = setup().await;
    let full: Vec<Value> = (1..=20).map(|i| book(i, &format!("Book {i}"), true)).collect();
    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": full, "totalPages": 9})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [book(21, "Last", true)]})))
        .mount(&server)
        .await;

    let mut list = console.list::<BookList>();
    let view = list.load().await;
    assert!(view.can_next);
    assert_eq!(view.page_buttons, vec![1, 2, 3, 4, 5]);

    list.next();
    assert_eq!(list.state().page, 2);
    // The first page stays on screen until the second one lands.
    let pending = list.view();
    assert!(pending.is_previous);
    assert_eq!(pending.rows.len(), 20);

    let view = list.load().await;
    assert_eq!(view.rows.len(), 1);
    assert!(!view.can_next);
    list.next();
    assert_eq!(list.state().page, 2);

    // Back restores page 1 from history.
    assert!(console.history().back());
    list.sync();
    assert_eq!(list.state().page, 1);
}

// ── Page-local filtering ────────────────────────────────────────────

#[tokio::test]
async fn test_search_without_matches_shows_searching_empty_state() {
    let (server, console) = setup().await;
    mount_books(&server, json!([book(1, "Dune", true), book(2, "Emma", false)])).await;

    let mut list = console.list::<BookList>();
    list.set_page(3);
    list.set_query("zzz");
    assert_eq!(list.state().page, 1);
    assert_eq!(console.history().current().get("q"), Some("zzz"));

    let view = list.load().await;
    assert_eq!(view.fetched, 2);
    assert!(view.rows.is_empty());
    assert_eq!(view.display, ListDisplay::Empty { searching: true });
}

#[tokio::test]
async fn test_search_and_activity_refine_the_page() {
    let (server, console) = setup().await;
    mount_books(&server, json!([book(1, "Dune", true), book(2, "Dune Messiah", false)])).await;

    let mut list = console.list::<BookList>();
    list.set_query("HERBERT");
    let view = list.load().await;
    assert_eq!(view.rows.len(), 2);

    list.set_active(ActiveFilter::Inactive);
    let view = list.load().await;
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].title, "Dune Messiah");
}

#[tokio::test]
async fn test_fetch_failure_degrades_to_empty() {
    let (server, console) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut list = console.list::<BookList>();
    let view = list.load().await;
    assert_eq!(view.display, ListDisplay::Empty { searching: false });
    assert_eq!(console.current_route(), Route::List(Resource::Books));
    assert!(matches!(
        list.error(),
        Some(bookdesk_core::CoreError::Api { status: Some(500), .. })
    ));
}

#[tokio::test]
async fn test_row_thumbnails_resolve_or_fall_back_to_empty() {
    let (server, console) = setup().await;
    mount_books(
        &server,
        json!([
            {"id": 1, "title": "A", "thumbnail": "thumbnails/a.png"},
            {"id": 2, "title": "B", "thumbnail": "thumbnails/missing.png"},
            {"id": 3, "title": "C", "thumbnail": "https://img.test/c.png"}
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/storage/url"))
        .and(query_param("key", "thumbnails/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": "https://cdn.test/a.png"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/storage/url"))
        .and(query_param("key", "thumbnails/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut list = console.list::<BookList>();
    let view = list.load().await;
    assert_eq!(list.preview(&view.rows[0]), Some("https://cdn.test/a.png"));
    assert_eq!(list.preview(&view.rows[1]), Some(""));
    assert_eq!(list.preview(&view.rows[2]), Some("https://img.test/c.png"));
}

// ── Delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_invalidates_and_refetches() {
    let (server, console) = setup().await;
    let mut toasts = console.notifier().subscribe();
    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([book(1, "Dune", true), book(2, "Emma", true)])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([book(2, "Emma", true)])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/books/1"))
        .and(query_param("delete_file", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut list = console.list::<BookList>();
    let view = list.load().await;
    list.request_delete(view.rows[0].clone());
    list.confirm_delete(DeleteOptions { delete_file: true })
        .await
        .unwrap();

    assert!(list.pending_delete().is_none());
    let view = list.view();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].title, "Emma");

    let toast = toasts.try_recv().unwrap();
    assert_eq!(toast.level, ToastLevel::Success);
    assert_eq!(toast.message, "Book deleted successfully");
}

#[tokio::test]
async fn test_delete_failure_keeps_confirmation_open() {
    let (server, console) = setup().await;
    let mut toasts = console.notifier().subscribe();
    mount_books(&server, json!([book(1, "Dune", true)])).await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/books/1"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "Book has downloads"})))
        .mount(&server)
        .await;

    let mut list = console.list::<BookList>();
    let view = list.load().await;
    list.request_delete(view.rows[0].clone());
    assert!(list.confirm_delete(DeleteOptions::default()).await.is_err());

    assert!(list.pending_delete().is_some());
    let toast = toasts.try_recv().unwrap();
    assert_eq!(toast.level, ToastLevel::Error);
    assert_eq!(toast.message, "Book has downloads");
}

#[tokio::test]
async fn test_settings_delete_by_key() {
    let (server, console) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"setting_key": "site_name", "setting_value": "Bookdesk"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/settings"))
        .and(query_param("key", "site_name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut list = console.list::<SettingList>();
    // Unpaginated: no defaults are written into the location.
    assert_eq!(console.history().current().href(), "/dashboard/settings");
    let view = list.load().await;
    assert!(!view.can_next);

    list.request_delete(list.find("site_name").unwrap());
    list.confirm_delete(DeleteOptions::default()).await.unwrap();
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_list_fetch_logs_out_once() {
    let (server, console) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut list = console.list::<BookList>();
    let view = list.load().await;

    assert_eq!(view.display, ListDisplay::Empty { searching: false });
    assert!(!console.is_authenticated());
    assert_eq!(console.current_route(), Route::Login);
    assert_eq!(console.history().current().path, "/login");
}

#[tokio::test]
async fn test_forced_logout_drops_cached_lists() {
    let (server, console) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([book(1, "Private notes", true)])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/categories"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Token expired"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-456",
            "name": "Grace",
            "role": "admin"
        })))
        .mount(&server)
        .await;

    let mut books = console.list::<BookList>();
    assert_eq!(books.load().await.rows.len(), 1);
    assert!(!console.cache().is_empty());

    console.list::<CategoryList>().load().await;
    assert!(!console.is_authenticated());
    assert_eq!(console.cache().len(), 0);

    console
        .login("grace@shop.test", &SecretString::from("hunter22".to_owned()))
        .await
        .unwrap();
    let mut books = console.list::<BookList>();
    assert_eq!(books.load().await.rows.len(), 1);
}
