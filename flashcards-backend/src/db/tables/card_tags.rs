//! Database operations for the card_tags association table.
//! A card's tag set is always replaced as a whole, never merged.

use rusqlite::Connection;

use super::tags::{tag_from_row, TAG_COLUMNS};
use crate::db::sqlite::now_timestamp;
use crate::db::{Database, StoreError, StoreResult};
use crate::models::Tag;

/// Replace every association of `card_id` with `tag_ids`.
/// Unknown tag ids fail on the foreign key.
pub(super) fn replace_card_tags(
    conn: &Connection,
    card_id: i64,
    tag_ids: &[i64],
) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM card_tags WHERE card_id = ?1",
        rusqlite::params![card_id],
    )?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    let (_, now_str) = now_timestamp();
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO card_tags (card_id, tag_id, created_at) VALUES (?1, ?2, ?3)",
    )?;
    for tag_id in tag_ids {
        stmt.execute(rusqlite::params![card_id, tag_id, now_str])?;
    }
    Ok(())
}

pub(super) fn query_tags_for_card(conn: &Connection, card_id: i64) -> rusqlite::Result<Vec<Tag>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM tags
         INNER JOIN card_tags ON card_tags.tag_id = tags.id
         WHERE card_tags.card_id = ?1
         ORDER BY tags.name ASC, tags.id ASC",
        TAG_COLUMNS
    ))?;
    let rows = stmt.query_map(rusqlite::params![card_id], tag_from_row)?;
    rows.collect()
}

pub(super) fn card_exists(conn: &Connection, card_id: i64) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM cards WHERE id = ?1",
        rusqlite::params![card_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

impl Database {
    /// Set the tags of a card, replacing any previous associations
    pub fn set_card_tags(&self, card_id: i64, tag_ids: &[i64]) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if !card_exists(&tx, card_id)? {
            return Err(StoreError::NotFound);
        }
        replace_card_tags(&tx, card_id, tag_ids)?;

        tx.commit()?;
        Ok(())
    }

    /// List the tags associated with a card
    pub fn list_tags_for_card(&self, card_id: i64) -> StoreResult<Vec<Tag>> {
        let conn = self.conn()?;
        Ok(query_tags_for_card(&conn, card_id)?)
    }
}
