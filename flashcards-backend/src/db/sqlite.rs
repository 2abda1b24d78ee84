//! SQLite connection pool and schema management

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Row};
use std::path::Path;

use super::StoreResult;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Special database URL for a process-local, non-persistent database
pub const IN_MEMORY_URL: &str = ":memory:";

const FILE_POOL_SIZE: u32 = 8;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS cards (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        front TEXT NOT NULL,
        back TEXT NOT NULL,
        owner TEXT,
        public INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS card_tags (
        card_id INTEGER NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
        tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        PRIMARY KEY (card_id, tag_id)
    );

    CREATE INDEX IF NOT EXISTS idx_cards_front ON cards(front);
    CREATE INDEX IF NOT EXISTS idx_card_tags_tag ON card_tags(tag_id);
";

/// Handle to the flashcard store. Table operations are implemented as
/// `impl Database` blocks in `db::tables`.
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database and make sure the schema exists.
    pub fn new(database_url: &str) -> StoreResult<Self> {
        let pool = if database_url == IN_MEMORY_URL {
            // Every in-memory connection is its own database, so keep exactly one alive.
            let manager = SqliteConnectionManager::memory().with_init(configure_connection);
            Pool::builder()
                .max_size(1)
                .max_lifetime(None)
                .idle_timeout(None)
                .build(manager)?
        } else {
            if let Some(parent) = Path::new(database_url).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let manager = SqliteConnectionManager::file(database_url).with_init(configure_connection);
            Pool::builder().max_size(FILE_POOL_SIZE).build(manager)?
        };

        let db = Self { pool };
        db.init_tables()?;
        Ok(db)
    }

    /// Check out a pooled connection
    pub fn conn(&self) -> StoreResult<DbConn> {
        Ok(self.pool.get()?)
    }

    fn init_tables(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }
}

fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
}

/// Current time in the format stored in every timestamp column
pub(crate) fn now_timestamp() -> (DateTime<Utc>, String) {
    let now = Utc::now();
    (now, now.to_rfc3339())
}

/// Read an RFC 3339 text column into a UTC timestamp
pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_database_creates_parent_dir_and_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("cards.db");

        let db = Database::new(db_path.to_str().unwrap()).expect("Failed to open database");
        assert!(db_path.exists());

        let conn = db.conn().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('cards', 'tags', 'card_tags')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::new(IN_MEMORY_URL).unwrap();
        let conn = db.conn().unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("cards.db");
        let url = db_path.to_str().unwrap();

        {
            let db = Database::new(url).unwrap();
            db.create_tag("kept").unwrap();
        }

        let db = Database::new(url).unwrap();
        let tags = db.list_tags().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "kept");
    }
}
