//! Field-level validation errors for inbound payloads.
//!
//! # Responsibility
//! - Collect every field error of a payload before failing the request.
//! - Provide the shared field checks used by all mappers.
//!
//! # Invariants
//! - Keys are field paths: `color`, `achievements[0].achievement_name`,
//!   `cats[2].birth_year`.
//! - Text values are trimmed before the blank check and returned trimmed.
//! - An explicit `null` is an error wherever a key may appear.

use crate::model::color::CatColor;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const NULL: &str = "This field may not be null.";

/// Aggregated validation failure, keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded for `field`, if any.
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Field paths with at least one error, sorted.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns `value` when nothing was recorded, otherwise the errors.
    pub fn finish<T>(self, value: impl FnOnce() -> Option<T>) -> Result<T, Self> {
        if !self.is_empty() {
            return Err(self);
        }
        // Every check records an error when it yields `None`.
        value().ok_or_else(|| {
            let mut errors = Self::new();
            errors.add("non_field_errors", "Invalid data.");
            errors
        })
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

/// Builds a nested field path such as `cats[1].color`.
pub fn nested_path(prefix: &str, index: usize, field: &str) -> String {
    format!("{prefix}[{index}].{field}")
}

/// Message for a value outside the enumerated choices.
pub fn invalid_choice(value: &str) -> String {
    format!("\"{value}\" is not a valid choice.")
}

/// Message for a slug reference with no matching record.
pub fn does_not_exist(slug_field: &str, value: &str) -> String {
    format!("Object with {slug_field}={value} does not exist.")
}

/// Wire value that keeps an absent key (`None`) apart from an explicit
/// `null` (`Some(None)`).
pub type Nullable<T> = Option<Option<T>>;

/// `deserialize_with` target for `Nullable` fields of a `#[serde(default)]`
/// payload. A missing key never reaches it and stays `None`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Nullable<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Requires a present, non-null value.
pub fn required<T>(errors: &mut ValidationErrors, field: &str, value: Nullable<T>) -> Option<T> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(None) => {
            errors.add(field, NULL);
            None
        }
        Some(value) => value,
    }
}

/// Requires a present, non-blank text value.
pub fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Nullable<String>,
) -> Option<String> {
    let trimmed = required(errors, field, value)?.trim().to_string();
    if trimmed.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    Some(trimmed)
}

/// Requires a color value from `CatColor::ALL`.
pub fn required_color(
    errors: &mut ValidationErrors,
    field: &str,
    value: Nullable<String>,
) -> Option<CatColor> {
    let raw = required(errors, field, value)?;
    let parsed = CatColor::parse(&raw);
    if parsed.is_none() {
        errors.add(field, invalid_choice(&raw));
    }
    parsed
}

/// Runs `check` only when the key is present.
///
/// Absent gives `Some(None)`; a present value that fails `check` (null
/// included) gives `None`.
pub fn when_present<T, U>(
    value: Nullable<T>,
    check: impl FnOnce(Nullable<T>) -> Option<U>,
) -> Option<Option<U>> {
    match value {
        None => Some(None),
        present => check(present).map(Some),
    }
}
