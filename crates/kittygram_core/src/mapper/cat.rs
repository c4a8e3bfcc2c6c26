//! Cat wire form and nested achievement upsert.
//!
//! # Responsibility
//! - Render a cat with its owner's last name, achievements and age.
//! - Validate cat payloads for top-level create/update and for nesting under
//!   an owner.
//! - Own the achievement link lifecycle of a cat.
//!
//! # Invariants
//! - `owner` is resolved against existing owners only; it is never created.
//! - Create links every descriptor in input order, duplicates included.
//! - Update replaces the whole achievement set only for a non-empty list;
//!   an absent or empty list leaves existing links untouched.

use crate::mapper::achievement::{
    validate_achievements, AchievementInput, AchievementPayload, AchievementRepr,
};
use crate::mapper::MapperResult;
use crate::model::cat::{Cat, CatId, NewCat};
use crate::model::color::CatColor;
use crate::model::owner::Owner;
use crate::repo::record_store::{RecordStore, RepoError, RepoResult};
use crate::validation::{
    does_not_exist, nested_path, nullable, required, required_color, required_text,
    when_present, Nullable, ValidationErrors,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Outbound cat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatRepr {
    pub id: CatId,
    pub name: String,
    pub color: CatColor,
    pub birth_year: i32,
    /// Owner's last name.
    pub owner: String,
    pub achievements: Vec<AchievementRepr>,
    /// `current_year - birth_year` at render time.
    pub age: i64,
}

/// Inbound cat. Absent keys stay `None`, explicit `null` becomes
/// `Some(None)`; `id` and `age` are read-only and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatPayload {
    #[serde(deserialize_with = "nullable")]
    pub name: Nullable<String>,
    #[serde(deserialize_with = "nullable")]
    pub color: Nullable<String>,
    #[serde(deserialize_with = "nullable")]
    pub birth_year: Nullable<i32>,
    /// Owner last name.
    #[serde(deserialize_with = "nullable")]
    pub owner: Nullable<String>,
    /// An empty list and an absent key are distinct: see
    /// `CatUpdate::achievements`.
    #[serde(deserialize_with = "nullable")]
    pub achievements: Nullable<Vec<AchievementPayload>>,
}

/// Validated top-level create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatCreate {
    pub name: String,
    pub color: CatColor,
    pub birth_year: i32,
    pub owner: Owner,
    pub achievements: Vec<AchievementInput>,
}

/// Validated partial update. `None` leaves the stored value as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatUpdate {
    pub name: Option<String>,
    pub color: Option<CatColor>,
    pub birth_year: Option<i32>,
    pub owner: Option<Owner>,
    /// Replacement set; ignored when `None` or empty.
    pub achievements: Option<Vec<AchievementInput>>,
}

/// Validated cat nested in an owner create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedCatCreate {
    pub name: String,
    pub color: CatColor,
    pub birth_year: i32,
}

/// Validated cat nested in an owner update, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedCatUpdate {
    pub name: String,
    pub color: Option<CatColor>,
    pub birth_year: Option<i32>,
}

impl CatPayload {
    /// Validates every field required for a top-level create.
    pub fn validate_create<S: RecordStore>(self, store: &S) -> MapperResult<CatCreate> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", self.name);
        let color = required_color(&mut errors, "color", self.color);
        let birth_year = required(&mut errors, "birth_year", self.birth_year);
        let owner = match required(&mut errors, "owner", self.owner) {
            Some(last_name) => resolve_owner(store, &mut errors, &last_name)?,
            None => None,
        };
        let achievements = required(&mut errors, "achievements", self.achievements)
            .and_then(|payloads| validate_achievements(&mut errors, "achievements", payloads));

        errors
            .finish(|| {
                Some(CatCreate {
                    name: name?,
                    color: color?,
                    birth_year: birth_year?,
                    owner: owner?,
                    achievements: achievements?,
                })
            })
            .map_err(Into::into)
    }

    /// Validates the fields present for a partial update.
    pub fn validate_update<S: RecordStore>(self, store: &S) -> MapperResult<CatUpdate> {
        let mut errors = ValidationErrors::new();
        let name = when_present(self.name, |name| required_text(&mut errors, "name", name));
        let color = when_present(self.color, |color| {
            required_color(&mut errors, "color", color)
        });
        let birth_year = when_present(self.birth_year, |birth_year| {
            required(&mut errors, "birth_year", birth_year)
        });
        let owner = when_present(self.owner, |owner| required(&mut errors, "owner", owner));
        let owner = match owner {
            Some(Some(last_name)) => resolve_owner(store, &mut errors, &last_name)?.map(Some),
            other => other.map(|_| None),
        };
        let achievements = when_present(self.achievements, |payloads| {
            required(&mut errors, "achievements", payloads).and_then(|payloads| {
                validate_achievements(&mut errors, "achievements", payloads)
            })
        });

        errors
            .finish(|| {
                Some(CatUpdate {
                    name: name?,
                    color: color?,
                    birth_year: birth_year?,
                    owner: owner?,
                    achievements: achievements?,
                })
            })
            .map_err(Into::into)
    }

    /// Validates a cat nested at `{field}[index]` of an owner create.
    ///
    /// `owner` and `achievements` are not read on this path.
    pub fn validate_nested_create(
        self,
        errors: &mut ValidationErrors,
        field: &str,
        index: usize,
    ) -> Option<NestedCatCreate> {
        let name = required_text(errors, &nested_path(field, index, "name"), self.name);
        let color = required_color(errors, &nested_path(field, index, "color"), self.color);
        let birth_year = required(
            errors,
            &nested_path(field, index, "birth_year"),
            self.birth_year,
        );

        Some(NestedCatCreate {
            name: name?,
            color: color?,
            birth_year: birth_year?,
        })
    }

    /// Validates a cat nested at `{field}[index]` of an owner update.
    pub fn validate_nested_update(
        self,
        errors: &mut ValidationErrors,
        field: &str,
        index: usize,
    ) -> Option<NestedCatUpdate> {
        let name = required_text(errors, &nested_path(field, index, "name"), self.name);
        let color = when_present(self.color, |color| {
            required_color(errors, &nested_path(field, index, "color"), color)
        });
        let birth_year = when_present(self.birth_year, |birth_year| {
            required(errors, &nested_path(field, index, "birth_year"), birth_year)
        });

        Some(NestedCatUpdate {
            name: name?,
            color: color?,
            birth_year: birth_year?,
        })
    }
}

fn resolve_owner<S: RecordStore>(
    store: &S,
    errors: &mut ValidationErrors,
    last_name: &str,
) -> RepoResult<Option<Owner>> {
    let owner = store.get_owner_by_last_name(last_name)?;
    if owner.is_none() {
        errors.add("owner", does_not_exist("last_name", last_name));
    }
    Ok(owner)
}

/// Creates the cat, then links each achievement in input order.
pub fn create_cat<S: RecordStore>(store: &S, input: CatCreate) -> RepoResult<Cat> {
    let cat = store.create_cat(&NewCat {
        name: input.name,
        color: input.color,
        birth_year: input.birth_year,
        owner_id: input.owner.id,
    })?;
    attach_achievements(store, cat.id, &input.achievements)?;
    Ok(cat)
}

/// Applies present scalar fields, persists, then replaces achievements when
/// a non-empty set was given.
pub fn update_cat<S: RecordStore>(store: &S, mut cat: Cat, input: CatUpdate) -> RepoResult<Cat> {
    if let Some(name) = input.name {
        cat.name = name;
    }
    if let Some(color) = input.color {
        cat.color = color;
    }
    if let Some(birth_year) = input.birth_year {
        cat.birth_year = birth_year;
    }
    if let Some(owner) = input.owner {
        cat.owner_id = owner.id;
    }
    store.save_cat(&cat)?;

    // TODO: product has not confirmed whether an empty list should clear the
    // set; until then it is a no-op like an absent list.
    if let Some(achievements) = input.achievements.filter(|list| !list.is_empty()) {
        let removed = store.clear_cat_achievements(cat.id)?;
        debug!(
            "event=achievements_clear module=mapper cat_id={} removed={}",
            cat.id, removed
        );
        attach_achievements(store, cat.id, &achievements)?;
    }
    Ok(cat)
}

/// Get-or-creates each achievement by name and links it to the cat.
/// Returns the number of links created.
pub fn attach_achievements<S: RecordStore>(
    store: &S,
    cat_id: CatId,
    achievements: &[AchievementInput],
) -> RepoResult<usize> {
    let mut created_achievements = 0usize;
    for input in achievements {
        let (achievement, created) = store.get_or_create_achievement(&input.name)?;
        if created {
            created_achievements += 1;
        }
        store.create_achievement_cat(achievement.id, cat_id)?;
    }
    debug!(
        "event=achievements_attach module=mapper cat_id={} links={} new_achievements={}",
        cat_id,
        achievements.len(),
        created_achievements
    );
    Ok(achievements.len())
}

/// Renders a cat, loading its owner and achievements.
pub fn cat_to_repr<S: RecordStore>(store: &S, cat: &Cat, current_year: i32) -> RepoResult<CatRepr> {
    let owner = store
        .get_owner(cat.owner_id)?
        .ok_or(RepoError::NotFound {
            entity: "owner",
            id: cat.owner_id,
        })?;
    cat_to_repr_with_owner(store, cat, &owner, current_year)
}

/// Renders a cat whose owner is already loaded.
pub(crate) fn cat_to_repr_with_owner<S: RecordStore>(
    store: &S,
    cat: &Cat,
    owner: &Owner,
    current_year: i32,
) -> RepoResult<CatRepr> {
    let achievements = store
        .cat_achievements(cat.id)?
        .iter()
        .map(AchievementRepr::from)
        .collect();

    Ok(CatRepr {
        id: cat.id,
        name: cat.name.clone(),
        color: cat.color,
        birth_year: cat.birth_year,
        owner: owner.last_name.clone(),
        achievements,
        age: cat.age_in(current_year),
    })
}
