//! SQLite cache database. The coordinator only ever calls `clear_all_tables`;
//! screens use the cache helpers.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StoreError;

pub trait LocalDatabase: Send + Sync {
    /// Empty every table in one transaction.
    fn clear_all_tables(&self) -> Result<(), StoreError>;
}

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Open (or create) a database at the given filesystem path and run migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Self {
            conn: Mutex::new(Connection::open(path)?),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database. Useful for testing.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.lock()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS cached_entries (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Poisoned("database connection"))
    }

    pub fn put_cached(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO cached_entries (key, value, updated_at)
             VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn cached(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .lock()?
            .query_row(
                "SELECT value FROM cached_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Total rows across all user tables.
    pub fn row_count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let mut total = 0u64;
        for table in user_tables(&conn)? {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", quote(&table)), [], |row| {
                    row.get(0)
                })?;
            total += count.max(0) as u64;
        }
        Ok(total)
    }
}

impl LocalDatabase for SqliteDatabase {
    fn clear_all_tables(&self) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tables = user_tables(&conn)?;
        let tx = conn.transaction()?;
        for table in &tables {
            tx.execute(&format!("DELETE FROM {}", quote(table)), [])?;
        }
        tx.commit()?;
        tracing::debug!(tables = tables.len(), "database tables cleared");
        Ok(())
    }
}

fn user_tables(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut tables = Vec::new();
    for row in rows {
        tables.push(row?);
    }
    Ok(tables)
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
