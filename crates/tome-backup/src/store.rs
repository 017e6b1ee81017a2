//! Embedded document store.
//!
//! A single-table SQLite store keyed by record id. Insertion is
//! duplicate-skipping, which is what makes repeated or interrupted
//! backup runs safe to resume: the pipeline re-fetches cheaply and
//! re-stores for free.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::debug;

use tome_core::{Error, Result};

fn map_store(err: rusqlite::Error) -> Error {
    Error::Store {
        message: err.to_string(),
    }
}

/// Rewrite keys containing the store's reserved path separator (`.`)
/// to an escaped form, recursively through nested structures.
///
/// Document viewers index dotted paths into stored documents, so a
/// literal dot inside a key would corrupt their lookups.
pub fn escape_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, val) in map {
                let escaped = if key.contains('.') {
                    key.replace('.', "___")
                } else {
                    key.clone()
                };
                out.insert(escaped, escape_keys(val));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(escape_keys).collect()),
        other => other.clone(),
    }
}

/// Embedded SQLite document store.
#[derive(Debug)]
pub struct DocStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl DocStore {
    /// Open (or create) the store at the given path, creating parent
    /// directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(map_store)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                kind TEXT NOT NULL,
                id   TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (kind, id)
             )",
            [],
        )
        .map_err(map_store)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    /// The store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a document unless one with the same kind and id already
    /// exists.
    ///
    /// Returns true when inserted, false when skipped as a duplicate.
    /// Duplicate skips are the expected case on resumed runs and are
    /// never an error. Keys are per kind, so an envelope keyed by its
    /// owner's id never shadows the owner record itself.
    pub fn insert_if_absent(&self, kind: &str, id: &str, value: &Value) -> Result<bool> {
        let conn = match self.conn.lock() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        };

        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM documents WHERE kind = ?1 AND id = ?2",
                params![kind, id],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_store)?;

        if existing.is_some() {
            debug!(id, kind, "document already present, skipping");
            return Ok(false);
        }

        let body = serde_json::to_string(&escape_keys(value))?;
        conn.execute(
            "INSERT INTO documents (kind, id, body) VALUES (?1, ?2, ?3)",
            params![kind, id, body],
        )
        .map_err(map_store)?;

        Ok(true)
    }

    /// Number of documents in the store.
    pub fn len(&self) -> Result<u64> {
        let conn = match self.conn.lock() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        };
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(map_store)
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
