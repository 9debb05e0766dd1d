//! End-to-end status code and envelope tests.
//!
//! | Code | Scenario |
//! |------|----------|
//! | 200 | `GET` greeting, successful query |
//! | 400 | Malformed or invalid command |
//! | 401 | Wrong secret |
//! | 404 | Unknown database |
//! | 405 | Method other than `GET`/`POST` |
//! | 500 | Prepare or execute failure |

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use sqlrelay_api::http::{create_router, AppState};
use sqlrelay_server::BindingRegistry;
use sqlrelay_storage::{SqliteConfig, SqliteDatabase};

use common::{command, create_test_app, post_json, post_raw, send, SECRET};

// ============================================================
// Section 1: Method handling
// ============================================================

#[tokio::test]
async fn test_non_post_methods_return_405() {
    let (app, database) = create_test_app().await;

    for method in ["PUT", "DELETE", "PATCH", "OPTIONS"] {
        let body = serde_json::to_string(&command("DELETE FROM users", "run", json!([]))).unwrap();
        let (status, bytes) = send(app.clone(), method, body).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
        let envelope: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope, json!({"err": "Method must be POST"}));
    }
    assert_eq!(database.prepare_count(), 0);
}

#[tokio::test]
async fn test_head_returns_405() {
    let (app, _) = create_test_app().await;

    let (status, _) = send(app, "HEAD", String::new()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_get_ignores_body_and_returns_greeting() {
    let (app, database) = create_test_app().await;

    let body = serde_json::to_string(&command("DELETE FROM users", "run", json!([]))).unwrap();
    let (status, bytes) = send(app, "GET", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, sqlrelay_api::http::GREETING.as_bytes());
    assert_eq!(database.prepare_count(), 0);
}

// ============================================================
// Section 2: Validation (400)
// ============================================================

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let (app, database) = create_test_app().await;

    for body in ["", "{not json", "[1, 2]", "null", "\"text\""] {
        let (status, envelope) = post_raw(app.clone(), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");
        assert!(envelope["err"].as_str().unwrap().starts_with("body: "));
    }
    assert_eq!(database.prepare_count(), 0);
}

#[tokio::test]
async fn test_missing_fields_report_first_path() {
    let (app, _) = create_test_app().await;

    let cases = [
        (json!({}), "body[secret]: Required"),
        (json!({"secret": SECRET}), "body[database]: Required"),
        (
            json!({"secret": SECRET, "database": "main"}),
            "body[query]: Required",
        ),
        (
            json!({"secret": 7, "database": "main", "query": "SELECT 1"}),
            "body[secret]: Expected string, received number",
        ),
        (
            json!({"secret": SECRET, "database": "main", "query": "SELECT 1", "params": {"a": 1}}),
            "body[params]: Expected array, received object",
        ),
    ];

    for (body, expected) in cases {
        let (status, envelope) = post_json(app.clone(), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope, json!({"err": expected}));
    }
}

#[tokio::test]
async fn test_unknown_method_returns_400() {
    let (app, database) = create_test_app().await;

    let (status, envelope) = post_json(app, command("SELECT 1", "each", json!([]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        envelope,
        json!({"err": "body[method]: Expected one of all|first|raw|run"})
    );
    assert_eq!(database.prepare_count(), 0);
}

// ============================================================
// Section 3: Resolution and authentication (404, 401)
// ============================================================

#[tokio::test]
async fn test_unknown_database_returns_404() {
    let (app, _) = create_test_app().await;

    let mut body = command("SELECT 1", "all", json!([]));
    body["database"] = json!("missing");
    let (status, envelope) = post_json(app, body).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(envelope, json!({"err": "Database not found"}));
}

#[tokio::test]
async fn test_secret_key_is_not_a_database() {
    let (app, _) = create_test_app().await;

    let mut body = command("SELECT 1", "all", json!([]));
    body["database"] = json!("main:SECRET");
    let (status, _) = post_json(app, body).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_secret_returns_401_without_touching_database() {
    let (app, database) = create_test_app().await;

    for secret in ["wrong", "", "S3CRET", "s3cret "] {
        let mut body = command("DELETE FROM users", "run", json!([]));
        body["secret"] = json!(secret);
        let (status, envelope) = post_json(app.clone(), body).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED, "{secret:?}");
        assert_eq!(envelope, json!({"err": "Invalid secret"}));
    }
    assert_eq!(database.prepare_count(), 0);

    let (_, envelope) = post_json(
        app,
        command("SELECT COUNT(*) AS n FROM users", "first", json!([])),
    )
    .await;
    assert_eq!(envelope["res"]["n"], 2);
}

// ============================================================
// Section 4: Execution modes (200)
// ============================================================

#[tokio::test]
async fn test_run_is_default_and_reports_changes() {
    let (app, _) = create_test_app().await;

    let mut body = command(
        "INSERT INTO users (name, age) VALUES (?, ?)",
        "run",
        json!(["carol", 41]),
    );
    body.as_object_mut().unwrap().remove("method");
    let (status, envelope) = post_json(app.clone(), body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["res"]["success"], true);
    assert_eq!(envelope["res"]["meta"]["changes"], 1);
    assert_eq!(envelope["res"]["meta"]["last_row_id"], 3);
    assert!(envelope["res"].get("results").is_none());

    let (_, envelope) = post_json(
        app,
        command("SELECT age FROM users WHERE name = ?", "first", json!(["carol"])),
    )
    .await;
    assert_eq!(envelope, json!({"res": {"age": 41}}));
}

#[tokio::test]
async fn test_all_returns_rows_in_column_order() {
    let (app, _) = create_test_app().await;

    let (status, envelope) = post_json(
        app,
        command("SELECT id, name, age FROM users ORDER BY id", "all", json!([])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        envelope["res"]["results"],
        json!([
            {"id": 1, "name": "alice", "age": 30},
            {"id": 2, "name": "bob", "age": null}
        ])
    );
    assert_eq!(envelope["res"]["success"], true);
    assert_eq!(envelope["res"]["meta"]["changes"], 0);
}

#[tokio::test]
async fn test_first_returns_row_or_null() {
    let (app, _) = create_test_app().await;

    let (_, envelope) = post_json(
        app.clone(),
        command("SELECT name FROM users WHERE id = ?", "first", json!([2])),
    )
    .await;
    assert_eq!(envelope, json!({"res": {"name": "bob"}}));

    let (status, envelope) = post_json(
        app,
        command("SELECT name FROM users WHERE id = ?", "first", json!([99])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope, json!({"res": null}));
}

#[tokio::test]
async fn test_raw_returns_arrays() {
    let (app, _) = create_test_app().await;

    let (_, envelope) = post_json(
        app,
        command(
            "SELECT id, name FROM users WHERE age IS NULL OR age > ? ORDER BY id",
            "raw",
            json!([18]),
        ),
    )
    .await;

    assert_eq!(envelope, json!({"res": [[1, "alice"], [2, "bob"]]}));
}

#[tokio::test]
async fn test_repeated_reads_are_byte_identical() {
    let (app, _) = create_test_app().await;
    let body = serde_json::to_string(&command("SELECT * FROM users ORDER BY id", "all", json!([])))
        .unwrap();

    let (_, first) = send(app.clone(), "POST", body.clone()).await;
    let (_, second) = send(app, "POST", body).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_reads_are_byte_identical_across_pooled_connections() {
    let dir = tempfile::tempdir().unwrap();
    let database = SqliteDatabase::from_config(&SqliteConfig {
        database_url: format!("sqlite://{}", dir.path().join("main.db").display()),
        max_connections: 2,
        ..Default::default()
    })
    .await
    .unwrap();
    let pool = database.pool().clone();
    let registry = BindingRegistry::builder()
        .database("main", Arc::new(database))
        .secret("main", SECRET)
        .build();
    let app = create_router(AppState::new(Arc::new(registry)));

    let (status, _) = post_json(
        app.clone(),
        command("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)", "run", json!([])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Pin the insert to one connection while the other sits idle.
    let mut writer = pool.acquire().await.unwrap();
    let idle = pool.acquire().await.unwrap();
    sqlx::query("INSERT INTO notes (body) VALUES ('hello')")
        .execute(&mut *writer)
        .await
        .unwrap();

    let body = serde_json::to_string(&command("SELECT * FROM notes", "all", json!([]))).unwrap();

    drop(idle);
    let (_, on_idle) = send(app.clone(), "POST", body.clone()).await;

    let held = pool.acquire().await.unwrap();
    drop(writer);
    let (_, on_writer) = send(app, "POST", body).await;
    drop(held);

    assert_eq!(on_idle, on_writer);
    let envelope: serde_json::Value = serde_json::from_slice(&on_writer).unwrap();
    assert_eq!(envelope["res"]["meta"]["last_row_id"], 0);
    assert_eq!(envelope["res"]["results"], json!([{"id": 1, "body": "hello"}]));
}

// ============================================================
// Section 5: Engine failures (500)
// ============================================================

#[tokio::test]
async fn test_invalid_sql_returns_500_without_detail() {
    let (app, database) = create_test_app().await;

    let (status, envelope) =
        post_json(app, command("SELECT * FROM nowhere", "all", json!([]))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(envelope, json!({"err": "Failed to prepare statement"}));
    assert_eq!(database.prepare_count(), 1);
}

#[tokio::test]
async fn test_param_count_mismatch_returns_500() {
    let (app, _) = create_test_app().await;

    let (status, envelope) = post_json(
        app,
        command("SELECT * FROM users WHERE id = ?", "all", json!([1, 2])),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(envelope, json!({"err": "Failed to prepare statement"}));
}

#[tokio::test]
async fn test_constraint_violation_returns_500_without_detail() {
    let (app, _) = create_test_app().await;

    let (status, envelope) = post_json(
        app,
        command("INSERT INTO users (name) VALUES (?)", "run", json!(["alice"])),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(envelope, json!({"err": "Failed to execute statement"}));
}
