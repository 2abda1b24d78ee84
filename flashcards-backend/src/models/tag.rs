use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label that can be attached to any number of cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tag entry for the selection widget on the card forms
#[derive(Debug, Clone, Serialize)]
pub struct TagOption {
    pub id: i64,
    pub name: String,
    pub selected: bool,
}

impl TagOption {
    /// Build the options list, marking the tags whose ids appear in `selected_ids`.
    pub fn from_tags(tags: &[Tag], selected_ids: &[i64]) -> Vec<TagOption> {
        tags.iter()
            .map(|tag| TagOption {
                id: tag.id,
                name: tag.name.clone(),
                selected: selected_ids.contains(&tag.id),
            })
            .collect()
    }
}
