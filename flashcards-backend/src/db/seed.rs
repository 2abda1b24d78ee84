//! Sample data inserted into an empty store on boot

use super::{Database, StoreResult};
use crate::models::NewCard;

pub const SEED_TAG: &str = "test";

/// (front, back, public)
const SEED_CARDS: &[(&str, &str, bool)] = &[
    (
        "Aardvark",
        "A medium-sized, burrowing, nocturnal mammal native to Africa. It is the only living species of the order Tubulidentata, although other prehistoric species and genera of Tubulidentata are known. Unlike most other insectivores, it has a long pig-like snout, which is used to sniff out food.",
        true,
    ),
    ("Lion", "A fierce animal.", true),
    ("Kitten", "A lovable animal.", true),
    ("Snake", "A tricky animal.", true),
    ("Pig", "A yummy animal.", true),
    ("Eagle", "A flying animal.", true),
    ("Shark", "A vicious swimming animal.", false),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub tags: usize,
    pub cards: usize,
}

impl Database {
    /// Insert the sample tag and cards. Each table is only seeded while empty,
    /// so running this on every boot is safe.
    pub fn seed_if_empty(&self) -> StoreResult<SeedSummary> {
        let mut summary = SeedSummary::default();

        if self.count_tags()? == 0 {
            self.create_tag(SEED_TAG)?;
            summary.tags += 1;
        }

        if self.count_cards()? == 0 {
            for (front, back, public) in SEED_CARDS {
                self.create_card(&NewCard {
                    front: front.to_string(),
                    back: back.to_string(),
                    owner: None,
                    public: *public,
                    tags: vec![],
                })?;
                summary.cards += 1;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::IN_MEMORY_URL;

    #[test]
    fn test_seed_runs_once() {
        let db = Database::new(IN_MEMORY_URL).unwrap();

        let first = db.seed_if_empty().unwrap();
        assert_eq!(first, SeedSummary { tags: 1, cards: 7 });

        let second = db.seed_if_empty().unwrap();
        assert_eq!(second, SeedSummary::default());
        assert_eq!(db.count_cards().unwrap(), 7);

        let cards = db.list_cards().unwrap();
        assert_eq!(cards[0].front, "Aardvark");
        let shark = cards.iter().find(|c| c.front == "Shark").unwrap();
        assert!(!shark.public);
    }
}
