//! Tag database operations

use rusqlite::Row;

use crate::db::sqlite::{now_timestamp, timestamp_column};
use crate::db::{Database, StoreResult};
use crate::models::Tag;

pub(super) const TAG_COLUMNS: &str = "tags.id, tags.name, tags.created_at, tags.updated_at";

pub(super) fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: timestamp_column(row, 2)?,
        updated_at: timestamp_column(row, 3)?,
    })
}

impl Database {
    /// List every tag, alphabetically
    pub fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tags ORDER BY tags.name ASC, tags.id ASC",
            TAG_COLUMNS
        ))?;
        let rows = stmt.query_map([], tag_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Insert a tag
    pub fn create_tag(&self, name: &str) -> StoreResult<Tag> {
        let conn = self.conn()?;
        let (now, now_str) = now_timestamp();

        conn.execute(
            "INSERT INTO tags (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
            rusqlite::params![name, now_str],
        )?;

        Ok(Tag {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn count_tags(&self) -> StoreResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;
        Ok(count)
    }
}
