//! Domain records for the cat registry.
//!
//! # Responsibility
//! - Define the stored shapes of owners, cats, achievements and their links.
//! - Keep derived values (cat age, owner full name) computed, never stored.
//!
//! # Invariants
//! - Every record is identified by a SQLite row id.
//! - A cat color is always one of `CatColor::ALL`.

pub mod achievement;
pub mod cat;
pub mod color;
pub mod owner;
