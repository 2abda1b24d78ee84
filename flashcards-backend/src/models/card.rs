use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Tag;

/// A flashcard: prompt on the front, answer on the back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub front: String,
    pub back: String,
    pub owner: Option<String>,
    pub public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A card together with its associated tags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardWithTags {
    #[serde(flatten)]
    pub card: Card,
    pub tags: Vec<Tag>,
}

impl CardWithTags {
    pub fn tag_ids(&self) -> Vec<i64> {
        self.tags.iter().map(|t| t.id).collect()
    }
}

/// Validated input for inserting a card
#[derive(Debug, Clone, PartialEq)]
pub struct NewCard {
    pub front: String,
    pub back: String,
    pub owner: Option<String>,
    pub public: bool,
    /// Full replacement tag set, deduplicated
    pub tags: Vec<i64>,
}

/// Validated partial update; `None` leaves the stored value untouched.
/// `owner: Some(None)` clears the owner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CardChanges {
    pub front: Option<String>,
    pub back: Option<String>,
    pub owner: Option<Option<String>>,
    pub public: Option<bool>,
    /// Tags are always replaced, an empty list removes every association
    pub tags: Vec<i64>,
}

impl CardChanges {
    pub fn apply_to(&self, card: &mut Card) {
        if let Some(front) = &self.front {
            card.front = front.clone();
        }
        if let Some(back) = &self.back {
            card.back = back.clone();
        }
        if let Some(owner) = &self.owner {
            card.owner = owner.clone();
        }
        if let Some(public) = self.public {
            card.public = public;
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("card {0} is required")]
    MissingField(&'static str),
    #[error("card {0} must not be blank")]
    BlankField(&'static str),
    #[error("invalid boolean for card public: {0}")]
    InvalidPublic(String),
    #[error("invalid tag id: {0}")]
    InvalidTagId(String),
}

/// Raw `card[...]` fields decoded from an urlencoded form body.
///
/// Scalars keep the last submitted value; tag ids accumulate across
/// `card[tags][]`, `card[tags]` and `card[tags][N]` keys. Empty tag values are
/// dropped so a form can send an explicit empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardForm {
    pub id: Option<String>,
    pub front: Option<String>,
    pub back: Option<String>,
    pub owner: Option<String>,
    pub public: Option<String>,
    pub tags: Vec<String>,
}

impl CardForm {
    pub fn parse(body: &[u8]) -> Self {
        let mut form = CardForm::default();

        for (key, value) in url::form_urlencoded::parse(body) {
            let Some(field) = key.strip_prefix("card[") else {
                continue;
            };
            match field {
                "id]" => form.id = Some(value.into_owned()),
                "front]" => form.front = Some(value.into_owned()),
                "back]" => form.back = Some(value.into_owned()),
                "owner]" => form.owner = Some(value.into_owned()),
                "public]" => form.public = Some(value.into_owned()),
                f if f == "tags]" || f.starts_with("tags][") => {
                    let value = value.trim();
                    if !value.is_empty() {
                        form.tags.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        form
    }

    /// The identifier carried in the body, if any
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn to_new_card(&self) -> Result<NewCard, ValidationError> {
        let front = required_text(self.front.as_deref(), "front")?;
        let back = required_text(self.back.as_deref(), "back")?;
        let public = match self.public.as_deref() {
            Some(raw) => parse_public(raw)?,
            None => false,
        };

        Ok(NewCard {
            front,
            back,
            owner: self.owner.as_deref().and_then(optional_text),
            public,
            tags: parse_tag_ids(&self.tags)?,
        })
    }

    pub fn to_changes(&self) -> Result<CardChanges, ValidationError> {
        let front = match self.front.as_deref() {
            Some(raw) => Some(required_text(Some(raw), "front")?),
            None => None,
        };
        let back = match self.back.as_deref() {
            Some(raw) => Some(required_text(Some(raw), "back")?),
            None => None,
        };
        let public = match self.public.as_deref() {
            Some(raw) => Some(parse_public(raw)?),
            None => None,
        };

        Ok(CardChanges {
            front,
            back,
            owner: self.owner.as_deref().map(optional_text),
            public,
            tags: parse_tag_ids(&self.tags)?,
        })
    }
}

fn required_text(raw: Option<&str>, field: &'static str) -> Result<String, ValidationError> {
    match raw {
        None => Err(ValidationError::MissingField(field)),
        Some(text) if text.trim().is_empty() => Err(ValidationError::BlankField(field)),
        Some(text) => Ok(text.to_string()),
    }
}

fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_public(raw: &str) -> Result<bool, ValidationError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" | "" => Ok(false),
        _ => Err(ValidationError::InvalidPublic(raw.to_string())),
    }
}

fn parse_tag_ids(raw: &[String]) -> Result<Vec<i64>, ValidationError> {
    let mut ids = Vec::with_capacity(raw.len());
    for value in raw {
        let id: i64 = value
            .parse()
            .map_err(|_| ValidationError::InvalidTagId(value.clone()))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bracketed_fields() {
        let body = b"card%5Bfront%5D=Owl&card%5Bback%5D=A+nocturnal+bird&card%5Bpublic%5D=true";
        let form = CardForm::parse(body);
        assert_eq!(form.front.as_deref(), Some("Owl"));
        assert_eq!(form.back.as_deref(), Some("A nocturnal bird"));
        assert_eq!(form.public.as_deref(), Some("true"));
        assert!(form.tags.is_empty());
    }

    #[test]
    fn test_parse_accumulates_tags_and_skips_empty() {
        let body = b"card[tags][]=&card[tags][]=2&card[tags][]=1&card[tags][3]=2&other=x";
        let form = CardForm::parse(body);
        assert_eq!(form.tags, vec!["2", "1", "2"]);

        let new_card = CardForm {
            front: Some("a".into()),
            back: Some("b".into()),
            ..form
        }
        .to_new_card()
        .unwrap();
        assert_eq!(new_card.tags, vec![2, 1]);
    }

    #[test]
    fn test_checkbox_last_value_wins() {
        let form = CardForm::parse(b"card[public]=false&card[public]=on");
        assert_eq!(form.public.as_deref(), Some("on"));

        let form = CardForm::parse(b"card[public]=false");
        assert_eq!(form.to_changes().unwrap().public, Some(false));
    }

    #[test]
    fn test_new_card_defaults() {
        let form = CardForm::parse(b"card[front]=Lion&card[back]=A+fierce+animal.&card[owner]=+");
        let card = form.to_new_card().unwrap();
        assert!(!card.public);
        assert_eq!(card.owner, None);
        assert!(card.tags.is_empty());
    }

    #[test]
    fn test_new_card_requires_front_and_back() {
        let form = CardForm::parse(b"card[back]=x");
        assert_eq!(form.to_new_card(), Err(ValidationError::MissingField("front")));

        let form = CardForm::parse(b"card[front]=x&card[back]=++");
        assert_eq!(form.to_new_card(), Err(ValidationError::BlankField("back")));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let form = CardForm::parse(b"card[front]=a&card[back]=b&card[tags][]=abc");
        assert_eq!(
            form.to_new_card(),
            Err(ValidationError::InvalidTagId("abc".to_string()))
        );

        let form = CardForm::parse(b"card[front]=a&card[back]=b&card[public]=maybe");
        assert!(matches!(
            form.to_new_card(),
            Err(ValidationError::InvalidPublic(_))
        ));
    }

    #[test]
    fn test_changes_only_touch_provided_fields() {
        let now = Utc::now();
        let mut card = Card {
            id: 7,
            front: "Pig".into(),
            back: "A yummy animal.".into(),
            owner: Some("sam".into()),
            public: true,
            created_at: now,
            updated_at: now,
        };

        let changes = CardForm::parse(b"card[id]=7&card[back]=A+smart+animal.&card[owner]=")
            .to_changes()
            .unwrap();
        changes.apply_to(&mut card);

        assert_eq!(card.front, "Pig");
        assert_eq!(card.back, "A smart animal.");
        assert_eq!(card.owner, None);
        assert!(card.public);
    }

    #[test]
    fn test_body_id() {
        assert_eq!(CardForm::parse(b"card[id]=+12+").id(), Some("12"));
        assert_eq!(CardForm::parse(b"card[id]=").id(), None);
    }
}
