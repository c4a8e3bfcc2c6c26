//! Achievement wire form. Only used nested inside a cat.
//!
//! Stored `name` travels as `achievement_name` on the wire.

use crate::model::achievement::{Achievement, AchievementId};
use crate::validation::{nested_path, nullable, required_text, Nullable, ValidationErrors};
use serde::{Deserialize, Serialize};

/// Outbound achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementRepr {
    pub id: AchievementId,
    pub achievement_name: String,
}

impl From<&Achievement> for AchievementRepr {
    fn from(value: &Achievement) -> Self {
        Self {
            id: value.id,
            achievement_name: value.name.clone(),
        }
    }
}

/// Inbound achievement descriptor. `id` is read-only and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AchievementPayload {
    #[serde(deserialize_with = "nullable")]
    pub achievement_name: Nullable<String>,
}

impl AchievementPayload {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            achievement_name: Some(Some(name.into())),
        }
    }
}

/// Validated achievement descriptor: the get-or-create key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementInput {
    pub name: String,
}

/// Validates a list of descriptors, recording errors under
/// `{field}[i].achievement_name`. Returns `None` if any entry failed.
pub fn validate_achievements(
    errors: &mut ValidationErrors,
    field: &str,
    payloads: Vec<AchievementPayload>,
) -> Option<Vec<AchievementInput>> {
    let total = payloads.len();
    let inputs: Vec<AchievementInput> = payloads
        .into_iter()
        .enumerate()
        .filter_map(|(index, payload)| {
            let path = nested_path(field, index, "achievement_name");
            required_text(errors, &path, payload.achievement_name)
                .map(|name| AchievementInput { name })
        })
        .collect();
    (inputs.len() == total).then_some(inputs)
}
