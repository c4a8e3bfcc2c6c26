//! List-view projection of a cat: `{id, name, color}`.

use crate::model::cat::{Cat, CatId};
use crate::model::color::CatColor;
use crate::validation::{nullable, required_color, when_present, Nullable, ValidationErrors};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatSummary {
    pub id: CatId,
    pub name: String,
    pub color: CatColor,
}

impl From<&Cat> for CatSummary {
    fn from(value: &Cat) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            color: value.color,
        }
    }
}

/// Summary-shaped list filter. Only `color` is read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatSummaryPayload {
    #[serde(deserialize_with = "nullable")]
    pub color: Nullable<String>,
}

/// Validated list filter; `None` matches every cat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatSummaryFilter {
    pub color: Option<CatColor>,
}

impl CatSummaryPayload {
    pub fn validate(self) -> Result<CatSummaryFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let color = when_present(self.color, |color| {
            required_color(&mut errors, "color", color)
        });
        errors.finish(|| Some(CatSummaryFilter { color: color? }))
    }
}

impl CatSummaryFilter {
    pub fn matches(&self, cat: &Cat) -> bool {
        self.color.map_or(true, |color| cat.color == color)
    }
}
