pub mod error;
pub mod seed;
pub mod sqlite;
pub mod tables;

pub use error::{StoreError, StoreResult};
pub use sqlite::Database;
#[cfg(test)]
pub use sqlite::IN_MEMORY_URL;
