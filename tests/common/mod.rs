// Shared test helpers for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::{TempDir, tempdir};

use itom_runner::core::error::EngineError;
use itom_runner::core::services::{HttpRequest, HttpResponse, HttpService, ServiceRegistry};
use itom_runner::infra::sql::SqliteService;

/// An in-process HTTP backend that answers with queued responses and
/// records every request it receives.
#[derive(Debug, Default)]
pub struct StubHttp {
    base: String,
    responses: Mutex<VecDeque<HttpResponse>>,
    fallback: Mutex<Option<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
    resets: AtomicUsize,
    broken: bool,
}

impl StubHttp {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            ..Self::default()
        }
    }

    /// A backend whose transport always fails.
    pub fn broken(base: &str) -> Self {
        Self {
            base: base.to_string(),
            broken: true,
            ..Self::default()
        }
    }

    /// Answers every request with `body` and status 200 once the queue is empty.
    pub fn always(self, body: &str) -> Self {
        *self.fallback.lock().unwrap() = Some(HttpResponse {
            status: 200,
            body: body.to_string(),
        });
        self
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            body: body.to_string(),
        });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpService for StubHttp {
    fn base_address(&self) -> &str {
        &self.base
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, EngineError> {
        if self.broken {
            return Err(EngineError::Backend {
                service: "stub".to_string(),
                message: "connection refused".to_string(),
            });
        }
        self.requests.lock().unwrap().push(request);
        let queued = self.responses.lock().unwrap().pop_front();
        Ok(queued
            .or_else(|| self.fallback.lock().unwrap().clone())
            .unwrap_or(HttpResponse {
                status: 404,
                body: String::new(),
            }))
    }

    async fn prepare(&self) -> Result<(), EngineError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A registry with `api` bound to `http` and `db` bound to an in-memory SQLite database.
pub fn registry_with(http: Arc<StubHttp>) -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();
    registry.register_http("api", http);
    let db = SqliteService::open("db", Path::new(":memory:"), None)
        .expect("Failed to open in-memory database");
    registry.register_sql("db", Arc::new(db));
    registry
}

pub const SQLITE_PROJECT: &str = r#"
description = "Integration Tests: $project"

[properties]
project = { default = "sample", env = "ITOM_TEST_PROJECT_NAME" }

[services.db]
driver = "database.sqlite"
path = "test.sqlite"
reset = "reset.sql"
"#;

pub const RESET_SQL: &str = r#"
DROP TABLE IF EXISTS items;
CREATE TABLE items (id INTEGER PRIMARY KEY, label TEXT NOT NULL);
INSERT INTO items (label) VALUES ('first'), ('second');
"#;

/// Creates a project with the SQLite model above and the given suites,
/// each written as `integration-tests/<category>/<file>`.
pub fn setup_project(suites: &[(&str, &str, &str)]) -> TempDir {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let root = temp_dir.path();
    fs::write(root.join("itom.toml"), SQLITE_PROJECT).expect("Failed to write itom.toml");
    fs::write(root.join("reset.sql"), RESET_SQL).expect("Failed to write reset.sql");
    for (category, file, content) in suites {
        let dir = root.join("integration-tests").join(category);
        fs::create_dir_all(&dir).expect("Failed to create category directory");
        fs::write(dir.join(file), content).expect("Failed to write suite");
    }
    temp_dir
}

/// A suite with one passing and one failing test against the `items` table.
pub const ITEMS_SUITE: &str = r#"
[[tests.cases]]
name = "two items are seeded"

[[tests.cases.blocks]]
kind = "command"
type = "sql.query"
service = "db"
body = "SELECT COUNT(*) AS total FROM items"

[[tests.cases.blocks]]
kind = "expected"
section = "0/total"
body = "2"

[[tests.cases]]
name = "labels are ordered"

[[tests.cases.blocks]]
kind = "command"
type = "sql.query"
service = "db"
body = "SELECT label FROM items ORDER BY id"

[[tests.cases.blocks]]
kind = "expected"
that = "labels in insertion order"
body = '[{"label": "first"}, {"label": "second"}]'
"#;

pub const FAILING_SUITE: &str = r#"
[[tests.cases]]
name = "wrong count"

[[tests.cases.blocks]]
kind = "command"
type = "sql.query"
service = "db"
body = "SELECT COUNT(*) AS total FROM items"

[[tests.cases.blocks]]
kind = "expected"
that = "five items"
section = "0/total"
body = "5"
"#;
