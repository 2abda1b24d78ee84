mod card;
mod flash;
mod tag;

pub use card::{Card, CardChanges, CardForm, CardWithTags, NewCard, ValidationError};
pub use flash::FlashMessage;
pub use tag::{Tag, TagOption};
