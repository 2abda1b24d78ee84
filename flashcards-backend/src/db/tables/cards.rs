//! Card database operations

use rusqlite::{Connection, OptionalExtension, Row};

use super::card_tags::{query_tags_for_card, replace_card_tags};
use crate::db::sqlite::{now_timestamp, timestamp_column};
use crate::db::{Database, StoreError, StoreResult};
use crate::models::{Card, CardChanges, CardWithTags, NewCard};

const CARD_COLUMNS: &str = "id, front, back, owner, public, created_at, updated_at";

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        front: row.get(1)?,
        back: row.get(2)?,
        owner: row.get(3)?,
        public: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}

fn fetch_card(conn: &Connection, id: i64) -> StoreResult<Card> {
    conn.query_row(
        &format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS),
        rusqlite::params![id],
        card_from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound)
}

impl Database {
    /// List all cards ordered by front text (binary collation, so case-sensitive)
    pub fn list_cards(&self) -> StoreResult<Vec<Card>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM cards ORDER BY front ASC, id ASC",
            CARD_COLUMNS
        ))?;
        let rows = stmt.query_map([], card_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Get a card by ID
    pub fn get_card(&self, id: i64) -> StoreResult<Card> {
        let conn = self.conn()?;
        fetch_card(&conn, id)
    }

    /// Get a card by ID including its tags
    pub fn get_card_with_tags(&self, id: i64) -> StoreResult<CardWithTags> {
        let conn = self.conn()?;
        let card = fetch_card(&conn, id)?;
        let tags = query_tags_for_card(&conn, id)?;
        Ok(CardWithTags { card, tags })
    }

    /// Insert a card and its tag associations in one transaction
    pub fn create_card(&self, new_card: &NewCard) -> StoreResult<Card> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let (now, now_str) = now_timestamp();

        tx.execute(
            "INSERT INTO cards (front, back, owner, public, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            rusqlite::params![
                new_card.front,
                new_card.back,
                new_card.owner,
                new_card.public,
                now_str
            ],
        )?;
        let id = tx.last_insert_rowid();
        replace_card_tags(&tx, id, &new_card.tags)?;
        tx.commit()?;

        Ok(Card {
            id,
            front: new_card.front.clone(),
            back: new_card.back.clone(),
            owner: new_card.owner.clone(),
            public: new_card.public,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply `changes` to an existing card and replace its tags
    pub fn update_card(&self, id: i64, changes: &CardChanges) -> StoreResult<Card> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut card = fetch_card(&tx, id)?;
        changes.apply_to(&mut card);
        let (now, now_str) = now_timestamp();
        card.updated_at = now;

        tx.execute(
            "UPDATE cards SET front = ?1, back = ?2, owner = ?3, public = ?4, updated_at = ?5
             WHERE id = ?6",
            rusqlite::params![card.front, card.back, card.owner, card.public, now_str, id],
        )?;
        replace_card_tags(&tx, id, &changes.tags)?;
        tx.commit()?;

        Ok(card)
    }

    /// Delete a card and its associations
    pub fn delete_card(&self, id: i64) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM card_tags WHERE card_id = ?1", rusqlite::params![id])?;
        let rows_affected = tx.execute("DELETE FROM cards WHERE id = ?1", rusqlite::params![id])?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        tx.commit()?;
        Ok(())
    }

    pub fn count_cards(&self) -> StoreResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, IN_MEMORY_URL, StoreError};
    use crate::models::{CardChanges, NewCard};

    fn new_card(front: &str, tags: Vec<i64>) -> NewCard {
        NewCard {
            front: front.to_string(),
            back: format!("Back of {}", front),
            owner: None,
            public: false,
            tags,
        }
    }

    #[test]
    fn test_create_then_get_round_trips() {
        let db = Database::new(IN_MEMORY_URL).unwrap();
        let tag = db.create_tag("birds").unwrap();

        let input = NewCard {
            front: "Owl".into(),
            back: "A nocturnal bird".into(),
            owner: Some("robin".into()),
            public: true,
            tags: vec![tag.id],
        };
        let created = db.create_card(&input).unwrap();

        let fetched = db.get_card_with_tags(created.id).unwrap();
        assert_eq!(fetched.card.front, "Owl");
        assert_eq!(fetched.card.back, "A nocturnal bird");
        assert_eq!(fetched.card.owner.as_deref(), Some("robin"));
        assert!(fetched.card.public);
        assert_eq!(fetched.tag_ids(), vec![tag.id]);
    }

    #[test]
    fn test_list_sorted_by_front_case_sensitive() {
        let db = Database::new(IN_MEMORY_URL).unwrap();
        for front in ["Snake", "aardvark", "Eagle", "Lion"] {
            db.create_card(&new_card(front, vec![])).unwrap();
        }

        let fronts: Vec<String> = db.list_cards().unwrap().into_iter().map(|c| c.front).collect();
        assert_eq!(fronts, vec!["Eagle", "Lion", "Snake", "aardvark"]);
    }

    #[test]
    fn test_list_empty() {
        let db = Database::new(IN_MEMORY_URL).unwrap();
        assert!(db.list_cards().unwrap().is_empty());
    }

    #[test]
    fn test_create_with_unknown_tag_rolls_back() {
        let db = Database::new(IN_MEMORY_URL).unwrap();
        let err = db.create_card(&new_card("Ghost", vec![999])).unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
        assert_eq!(db.count_cards().unwrap(), 0);
    }

    #[test]
    fn test_update_is_idempotent() {
        let db = Database::new(IN_MEMORY_URL).unwrap();
        let tag = db.create_tag("mammals").unwrap();
        let card = db.create_card(&new_card("Pig", vec![])).unwrap();

        let changes = CardChanges {
            back: Some("A smart animal.".into()),
            public: Some(true),
            tags: vec![tag.id],
            ..CardChanges::default()
        };

        db.update_card(card.id, &changes).unwrap();
        let once = db.get_card_with_tags(card.id).unwrap();
        db.update_card(card.id, &changes).unwrap();
        let twice = db.get_card_with_tags(card.id).unwrap();

        assert_eq!(once.card.front, twice.card.front);
        assert_eq!(once.card.back, twice.card.back);
        assert_eq!(once.card.public, twice.card.public);
        assert_eq!(once.card.owner, twice.card.owner);
        assert_eq!(once.tag_ids(), twice.tag_ids());
        assert_eq!(twice.card.back, "A smart animal.");
    }

    #[test]
    fn test_update_with_empty_tags_clears_associations() {
        let db = Database::new(IN_MEMORY_URL).unwrap();
        let a = db.create_tag("a").unwrap();
        let b = db.create_tag("b").unwrap();
        let card = db.create_card(&new_card("Shark", vec![a.id, b.id])).unwrap();
        assert_eq!(db.list_tags_for_card(card.id).unwrap().len(), 2);

        db.update_card(card.id, &CardChanges::default()).unwrap();
        assert!(db.list_tags_for_card(card.id).unwrap().is_empty());
    }

    #[test]
    fn test_update_missing_card() {
        let db = Database::new(IN_MEMORY_URL).unwrap();
        let err = db.update_card(42, &CardChanges::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let db = Database::new(IN_MEMORY_URL).unwrap();
        let tag = db.create_tag("t").unwrap();
        let card = db.create_card(&new_card("Lion", vec![tag.id])).unwrap();

        db.delete_card(card.id).unwrap();
        assert!(db.get_card(card.id).unwrap_err().is_not_found());
        assert!(db.list_tags_for_card(card.id).unwrap().is_empty());
        // Tags outlive the cards that referenced them
        assert_eq!(db.count_tags().unwrap(), 1);

        assert!(db.delete_card(card.id).unwrap_err().is_not_found());
    }
}
