// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Spendbook", "spendbook"));

pub const DB_ENV_VAR: &str = "SPENDBOOK_DB";
const DB_FILE_NAME: &str = "spendbook.sqlite";

/// Resolves the ledger file: explicit path, then `SPENDBOOK_DB`, then the
/// platform data directory.
pub fn db_path(explicit: Option<&str>) -> Result<PathBuf> {
    let env = std::env::var(DB_ENV_VAR).ok();
    resolve_db_path(explicit, env.as_deref())
}

pub fn resolve_db_path(explicit: Option<&str>, env: Option<&str>) -> Result<PathBuf> {
    if let Some(p) = explicit.or(env).map(str::trim).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join(DB_FILE_NAME))
}

pub fn open(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS spending_items(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        cost_cents INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        comment TEXT NOT NULL DEFAULT '',
        FOREIGN KEY(category_id) REFERENCES categories(id)
    );
    CREATE INDEX IF NOT EXISTS idx_spending_items_date ON spending_items(date);
    "#,
    )
}
