//! Shared test utilities for sqlrelay API tests.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use sqlrelay_api::http::{create_router, AppState};
use sqlrelay_server::BindingRegistry;
use sqlrelay_storage::{
    Database, PreparedStatement, SqliteConfig, SqliteDatabase, StorageResult,
};

/// Secret configured for the `main` database.
pub const SECRET: &str = "s3cret";

/// Database wrapper that counts `prepare` calls.
pub struct RecordingDatabase {
    inner: SqliteDatabase,
    prepares: AtomicUsize,
}

impl RecordingDatabase {
    pub fn prepare_count(&self) -> usize {
        self.prepares.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Database for RecordingDatabase {
    async fn prepare(&self, sql: &str) -> StorageResult<Box<dyn PreparedStatement>> {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        self.inner.prepare(sql).await
    }
}

/// Creates an in-memory database with a `users` table holding two rows.
pub async fn seeded_database() -> Arc<RecordingDatabase> {
    let inner = SqliteDatabase::from_config(&SqliteConfig::in_memory())
        .await
        .unwrap();

    for sql in [
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE, age INTEGER)",
        "INSERT INTO users (name, age) VALUES ('alice', 30), ('bob', NULL)",
    ] {
        inner
            .prepare(sql)
            .await
            .unwrap()
            .bind(&[])
            .unwrap()
            .run()
            .await
            .unwrap();
    }

    Arc::new(RecordingDatabase {
        inner,
        prepares: AtomicUsize::new(0),
    })
}

/// Builds the app with `main` bound to a seeded database.
pub async fn create_test_app() -> (axum::Router, Arc<RecordingDatabase>) {
    let database = seeded_database().await;
    let registry = BindingRegistry::builder()
        .database("main", Arc::clone(&database) as Arc<dyn Database>)
        .secret("main", SECRET)
        .build();
    let app = create_router(AppState::new(Arc::new(registry)));
    (app, database)
}

/// Builds a command body for `main` with the correct secret.
pub fn command(query: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "secret": SECRET,
        "database": "main",
        "query": query,
        "params": params,
        "method": method,
    })
}

/// POSTs a JSON body and returns status and parsed envelope.
pub async fn post_json(
    app: axum::Router,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    post_raw(app, &serde_json::to_string(&body).unwrap()).await
}

/// POSTs a raw string body and returns status and parsed envelope.
pub async fn post_raw(app: axum::Router, body: &str) -> (StatusCode, serde_json::Value) {
    let (status, bytes) = send(app, "POST", body.to_string()).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Sends a request and returns status and raw body bytes.
pub async fn send(app: axum::Router, method: &str, body: String) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}
