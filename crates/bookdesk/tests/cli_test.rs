//! Integration tests for the `bookdesk` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without a server; the list and delete flows run against a mock API.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `bookdesk` binary with env isolation.
///
/// Clears all `BOOKDESK_*` env vars and points config and data
/// directories at `home` so tests never touch the user's real setup.
fn bookdesk_cmd(home: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("bookdesk");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("DBUS_SESSION_BUS_ADDRESS", "unix:path=/nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("BOOKDESK_PROFILE")
        .env_remove("BOOKDESK_API_URL")
        .env_remove("BOOKDESK_OUTPUT")
        .env_remove("BOOKDESK_INSECURE")
        .env_remove("BOOKDESK_TIMEOUT")
        .env_remove("BOOKDESK_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn book(id: u64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "slug": title.to_lowercase(),
        "category_name": "Sci-Fi",
        "author_names": "Frank Herbert",
        "is_active": 1,
        "is_featured": 0
    })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = bookdesk_cmd(&home).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    bookdesk_cmd(&home).arg("--help").assert().success().stdout(
        predicate::str::contains("bookstore")
            .and(predicate::str::contains("books"))
            .and(predicate::str::contains("authors"))
            .and(predicate::str::contains("dashboard")),
    );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    bookdesk_cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bookdesk"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    bookdesk_cmd(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = TempDir::new().unwrap();
    bookdesk_cmd(&home)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    let home = TempDir::new().unwrap();
    bookdesk_cmd(&home)
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_without_file() {
    let home = TempDir::new().unwrap();
    bookdesk_cmd(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_set_then_profiles() {
    let home = TempDir::new().unwrap();
    bookdesk_cmd(&home)
        .args(["-p", "staging", "config", "set", "api_url", "https://staging.test/api"])
        .assert()
        .success();
    bookdesk_cmd(&home)
        .args(["config", "profiles", "-p", "staging"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* staging").and(predicate::str::contains("https://staging.test/api")));
}

#[test]
fn test_config_use_unknown_profile() {
    let home = TempDir::new().unwrap();
    let output = bookdesk_cmd(&home)
        .args(["config", "use", "nowhere"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("nowhere"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = TempDir::new().unwrap();
    let output = bookdesk_cmd(&home).arg("foobar").output().unwrap();
    assert!(!output.status.success(), "Expected failure for invalid subcommand");
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let home = TempDir::new().unwrap();
    let output = bookdesk_cmd(&home)
        .args(["-o", "xml", "books", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("xml"));
}

#[test]
fn test_invalid_spec_argument() {
    let home = TempDir::new().unwrap();
    let output = bookdesk_cmd(&home)
        .args(["books", "create", "--title", "Dune", "--spec", "Pages"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("NAME=VALUE"));
}

#[test]
fn test_books_list_without_login() {
    let home = TempDir::new().unwrap();
    let output = bookdesk_cmd(&home)
        .args(["books", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
    assert!(combined_output(&output).contains("login"));
}

// ── Against a mock API ──────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_books_list_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [book(5, "Dune"), book(6, "Emma")],
            "total": 2,
            "totalPages": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = bookdesk_cmd(&home)
        .env("BOOKDESK_TOKEN", "test-token")
        .args(["--api-url", &server.uri(), "-o", "json", "books", "list"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let books: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let titles: Vec<&str> = books
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Dune", "Emma"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_books_list_plain_applies_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/books"))
        .and(query_param("q", "dune"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            book(5, "Dune"),
            book(6, "Emma")
        ])))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    bookdesk_cmd(&home)
        .env("BOOKDESK_TOKEN", "test-token")
        .args(["--api-url", &server.uri(), "-o", "plain", "books", "list", "--q", "dune"])
        .assert()
        .success()
        .stdout("5\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expired_session_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/authors"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "expired"})))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = bookdesk_cmd(&home)
        .env("BOOKDESK_TOKEN", "stale")
        .args(["--api-url", &server.uri(), "authors", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_book_delete_with_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/books/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(book(5, "Dune")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/books/5"))
        .and(query_param("delete_file", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    bookdesk_cmd(&home)
        .env("BOOKDESK_TOKEN", "test-token")
        .args(["--api-url", &server.uri(), "-y", "books", "delete", "5", "--delete-file"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Book deleted successfully"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_needs_yes_without_a_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/categories/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4, "name": "Sci-Fi", "slug": "sci-fi", "is_active": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = bookdesk_cmd(&home)
        .env("BOOKDESK_TOKEN", "test-token")
        .args(["--api-url", &server.uri(), "categories", "delete", "4"])
        .write_stdin("")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}
