//! Cat record and derived age.
//!
//! # Invariants
//! - `color` is a `CatColor`, so it cannot hold a value outside the choices.
//! - Age is never stored; it is `current_year - birth_year` at read time and
//!   may be negative for birth years in the future.

use crate::model::color::CatColor;
use crate::model::owner::OwnerId;
use chrono::Datelike;

/// Row id of a cat.
pub type CatId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cat {
    pub id: CatId,
    pub name: String,
    pub color: CatColor,
    pub birth_year: i32,
    /// Back-reference to the owning owner; lookup only.
    pub owner_id: OwnerId,
}

/// Insert shape for a new cat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCat {
    pub name: String,
    pub color: CatColor,
    pub birth_year: i32,
    pub owner_id: OwnerId,
}

impl Cat {
    /// Age relative to `current_year`. No clamping; widened so any pair of
    /// `i32` years is representable.
    pub fn age_in(&self, current_year: i32) -> i64 {
        i64::from(current_year) - i64::from(self.birth_year)
    }
}

/// Current calendar year on the local wall clock.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}
