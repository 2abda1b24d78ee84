//! Table operations, split by table.
//!
//! Each module contains `impl Database` blocks for one table.

mod card_tags;
mod cards;
mod tags;
