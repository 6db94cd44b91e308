//! # SQL Backend Module / SQL 后端模块
//!
//! [`SqliteService`] implements [`SqlService`] on `rusqlite`. Query results
//! are shaped as a JSON array of row objects; statements without result
//! columns report `{"changes": n}`.
//!
//! [`SqliteService`] 基于 `rusqlite` 实现 [`SqlService`]。查询结果被整理为行对象组成的 JSON 数组；
//! 没有结果列的语句返回 `{"changes": n}`。

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use serde_json::{Map, Value as JsonValue, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::core::error::EngineError;
use crate::core::services::SqlService;

#[derive(Debug)]
pub struct SqliteService {
    name: String,
    connection: Mutex<Connection>,
    reset: Option<PathBuf>,
}

impl SqliteService {
    /// Opens (or creates) the database at `path`; `:memory:` opens an in-memory database.
    pub fn open(name: &str, path: &Path, reset: Option<PathBuf>) -> Result<Self> {
        let connection = if path.as_os_str() == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .with_context(|| format!("Failed to open SQLite database: {}", path.display()))?;

        Ok(Self {
            name: name.to_string(),
            connection: Mutex::new(connection),
            reset,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, EngineError> {
        self.connection.lock().map_err(|_| EngineError::Backend {
            service: self.name.clone(),
            message: "database connection lock poisoned".to_string(),
        })
    }

    fn backend_error(&self, message: impl ToString) -> EngineError {
        EngineError::Backend {
            service: self.name.clone(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl SqlService for SqliteService {
    async fn query(&self, statement: &str) -> Result<String, EngineError> {
        let connection = self.lock()?;
        run_statement(&connection, statement).map_err(|e| self.backend_error(e))
    }

    /// Executes the reset script, if any.
    async fn prepare(&self) -> Result<(), EngineError> {
        let Some(reset) = &self.reset else {
            return Ok(());
        };
        debug!("resetting '{}' with {}", self.name, reset.display());
        let script = fs::read_to_string(reset)
            .map_err(|e| self.backend_error(format!("{}: {e}", reset.display())))?;
        let connection = self.lock()?;
        connection
            .execute_batch(&script)
            .map_err(|e| self.backend_error(e))
    }
}

fn run_statement(connection: &Connection, statement: &str) -> rusqlite::Result<String> {
    let mut prepared = connection.prepare(statement)?;
    if prepared.column_count() == 0 {
        let changes = prepared.execute([])?;
        return Ok(json!({ "changes": changes }).to_string());
    }

    let columns: Vec<String> = prepared
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let mut rows = prepared.query([])?;
    let mut shaped = Vec::new();
    while let Some(row) = rows.next()? {
        let mut object = Map::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            object.insert(column.clone(), to_json(row.get_ref(index)?));
        }
        shaped.push(JsonValue::Object(object));
    }
    Ok(JsonValue::Array(shaped).to_string())
}

fn to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => json!(i),
        ValueRef::Real(f) => json!(f),
        ValueRef::Text(text) => JsonValue::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => JsonValue::Array(bytes.iter().map(|b| json!(b)).collect()),
    }
}
