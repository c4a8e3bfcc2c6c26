//! Wire mappers: translate between JSON payloads and stored records.
//!
//! # Responsibility
//! - Define the wire shapes (`*Repr` outbound, `*Payload` inbound).
//! - Validate inbound payloads into typed inputs before any write.
//! - Run the nested create/update sequences against a `RecordStore`.
//!
//! # Invariants
//! - Validation completes (all fields) before the first store mutation.
//! - Mappers never open transactions; the service wraps each call in one.
//!
//! Nesting on write: owner → cat → achievement.

pub mod achievement;
pub mod cat;
pub mod cat_summary;
pub mod owner;

use crate::repo::record_store::RepoError;
use crate::validation::ValidationErrors;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MapperResult<T> = Result<T, MapperError>;

/// Failure of a validation step that needs store access (owner lookup).
#[derive(Debug)]
pub enum MapperError {
    Validation(ValidationErrors),
    Repo(RepoError),
}

impl Display for MapperError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MapperError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationErrors> for MapperError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for MapperError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
