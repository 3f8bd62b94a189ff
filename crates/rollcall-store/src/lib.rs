//! rollcall-store — SQLite-backed student record store.
//!
//! Persists enrollment records as `(identity, image)` rows. Identities are
//! deliberately not unique at the row level: re-enrolling someone adds
//! another reference image, and the gallery groups rows by identity at
//! bootstrap.

use std::path::Path;

use rusqlite::Connection;

use rollcall_core::{RecordStore, StoreError, StoredRecord};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS students (
    id       INTEGER PRIMARY KEY,
    identity TEXT NOT NULL,
    image    BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_students_identity ON students (identity);
";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `path` and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(dir) = path.as_ref().parent() {
            std::fs::create_dir_all(dir).map_err(StoreError::backend)?;
        }
        let conn = Connection::open(path.as_ref()).map_err(StoreError::backend)?;
        Self::with_connection(conn)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::backend)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA).map_err(StoreError::backend)?;
        Ok(Self { conn })
    }

    /// Number of persisted records (rows, not distinct identities).
    pub fn record_count(&self) -> Result<usize, StoreError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
            .map_err(StoreError::backend)
    }
}

impl RecordStore for SqliteStore {
    fn put_record(&mut self, identity: &str, image: &[u8]) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO students (identity, image) VALUES (?1, ?2)",
                rusqlite::params![identity, image],
            )
            .map_err(StoreError::backend)?;
        tracing::debug!(identity = %identity, bytes = image.len(), "record persisted");
        Ok(())
    }

    fn all_records(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT identity, image FROM students ORDER BY id")
            .map_err(StoreError::backend)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StoredRecord {
                    identity: row.get(0)?,
                    image: row.get(1)?,
                })
            })
            .map_err(StoreError::backend)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::backend)
    }
}
