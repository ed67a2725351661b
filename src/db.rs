// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::notify::{ChangeEvent, ChangeNotifier, ChangeOrigin};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, params};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Tallybook", "tallybook"));

/// Every key this application owns contains this marker.
pub const NAMESPACE: &str = "tallybook";

pub fn in_namespace(key: &str) -> bool {
    key.contains(NAMESPACE)
}

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var("TALLYBOOK_DB") {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p.trim()));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("tallybook.sqlite"))
}

pub fn open_or_init() -> Result<Store> {
    let path = db_path()?;
    Store::open(&path)
}

/// Persistent key-value store: one row per key, values are JSON text.
///
/// Writes to namespaced keys are republished through the store's
/// [`ChangeNotifier`] after they commit.
pub struct Store {
    conn: Connection,
    notifier: RefCell<ChangeNotifier>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn =
            Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn,
            notifier: RefCell::new(ChangeNotifier::new()),
        })
    }

    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.notifier.borrow_mut().subscribe()
    }

    pub fn get(&self, key: &str) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key=?1", params![key], |r| {
                r.get(0)
            })
            .optional()
    }

    pub fn set(&self, key: &str, value: &str) -> rusqlite::Result<()> {
        self.set_with_origin(key, value, ChangeOrigin::Local)
    }

    pub fn set_with_origin(
        &self,
        key: &str,
        value: &str,
        origin: ChangeOrigin,
    ) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO kv(key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
            params![key, value],
        )?;
        if in_namespace(key) {
            self.notifier.borrow_mut().publish(ChangeEvent {
                key: key.to_string(),
                value: value.to_string(),
                origin,
            });
        }
        Ok(())
    }

    pub fn remove(&self, key: &str) -> rusqlite::Result<bool> {
        let n = self.conn.execute("DELETE FROM kv WHERE key=?1", params![key])?;
        Ok(n > 0)
    }

    /// All `(key, value)` pairs whose key contains `marker`.
    pub fn entries_matching(&self, marker: &str) -> rusqlite::Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM kv WHERE instr(key, ?1) > 0 ORDER BY key")?;
        let rows = stmt.query_map(params![marker], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        rows.collect()
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS kv(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    )?;
    Ok(())
}
