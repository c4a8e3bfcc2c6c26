//! Owner wire form and nested cat upsert.
//!
//! # Invariants
//! - Nested cats never go through achievement handling.
//! - On update, nested cats are matched by `(name, owner)`; an unmatched
//!   name creates a new cat for this owner.

use crate::mapper::cat::{
    cat_to_repr_with_owner, CatPayload, CatRepr, NestedCatCreate, NestedCatUpdate,
};
use crate::model::cat::NewCat;
use crate::model::owner::{NewOwner, Owner, OwnerId};
use crate::repo::record_store::{RecordStore, RepoResult};
use crate::validation::{
    nullable, required, required_text, when_present, Nullable, ValidationErrors,
};
use log::debug;
use serde::{Deserialize, Serialize};

const CATS_FIELD: &str = "cats";

/// Outbound owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerRepr {
    /// Row id for follow-up calls. Not serialized.
    #[serde(skip)]
    pub id: OwnerId,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub cats: Vec<CatRepr>,
}

/// Inbound owner. `full_name` is read-only and ignored; `cats` may be
/// absent but not `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OwnerPayload {
    #[serde(deserialize_with = "nullable")]
    pub first_name: Nullable<String>,
    #[serde(deserialize_with = "nullable")]
    pub last_name: Nullable<String>,
    #[serde(deserialize_with = "nullable")]
    pub cats: Nullable<Vec<CatPayload>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerCreate {
    pub first_name: String,
    pub last_name: String,
    pub cats: Vec<NestedCatCreate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub cats: Vec<NestedCatUpdate>,
}

impl OwnerPayload {
    pub fn validate_create(self) -> Result<OwnerCreate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let first_name = required_text(&mut errors, "first_name", self.first_name);
        let last_name = required_text(&mut errors, "last_name", self.last_name);
        let cats = validate_nested_cats(
            &mut errors,
            self.cats,
            CatPayload::validate_nested_create,
        );

        errors.finish(|| {
            Some(OwnerCreate {
                first_name: first_name?,
                last_name: last_name?,
                cats: cats?,
            })
        })
    }

    pub fn validate_update(self) -> Result<OwnerUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let first_name = when_present(self.first_name, |first_name| {
            required_text(&mut errors, "first_name", first_name)
        });
        let last_name = when_present(self.last_name, |last_name| {
            required_text(&mut errors, "last_name", last_name)
        });
        let cats = validate_nested_cats(
            &mut errors,
            self.cats,
            CatPayload::validate_nested_update,
        );

        errors.finish(|| {
            Some(OwnerUpdate {
                first_name: first_name?,
                last_name: last_name?,
                cats: cats?,
            })
        })
    }
}

fn validate_nested_cats<T>(
    errors: &mut ValidationErrors,
    payloads: Nullable<Vec<CatPayload>>,
    validate: impl Fn(CatPayload, &mut ValidationErrors, &str, usize) -> Option<T>,
) -> Option<Vec<T>> {
    let payloads =
        when_present(payloads, |cats| required(errors, CATS_FIELD, cats))?.unwrap_or_default();
    let total = payloads.len();
    let valid: Vec<T> = payloads
        .into_iter()
        .enumerate()
        .filter_map(|(index, payload)| validate(payload, errors, CATS_FIELD, index))
        .collect();
    (valid.len() == total).then_some(valid)
}

/// Creates the owner, then each nested cat directly under it.
pub fn create_owner<S: RecordStore>(store: &S, input: OwnerCreate) -> RepoResult<Owner> {
    let owner = store.create_owner(&NewOwner {
        first_name: input.first_name,
        last_name: input.last_name,
    })?;

    for cat in input.cats {
        store.create_cat(&NewCat {
            name: cat.name,
            color: cat.color,
            birth_year: cat.birth_year,
            owner_id: owner.id,
        })?;
    }
    Ok(owner)
}

/// Applies present owner fields, persists, then upserts nested cats by name.
///
/// A cat created here takes the descriptor's color and birth year, falling
/// back to the default color and `current_year`.
pub fn update_owner<S: RecordStore>(
    store: &S,
    mut owner: Owner,
    input: OwnerUpdate,
    current_year: i32,
) -> RepoResult<Owner> {
    if let Some(first_name) = input.first_name {
        owner.first_name = first_name;
    }
    if let Some(last_name) = input.last_name {
        owner.last_name = last_name;
    }
    store.save_owner(&owner)?;

    for nested in input.cats {
        let (mut cat, created) = store.get_or_create_cat(&NewCat {
            name: nested.name,
            color: nested.color.unwrap_or_default(),
            birth_year: nested.birth_year.unwrap_or(current_year),
            owner_id: owner.id,
        })?;
        if let Some(color) = nested.color {
            cat.color = color;
        }
        if let Some(birth_year) = nested.birth_year {
            cat.birth_year = birth_year;
        }
        store.save_cat(&cat)?;
        debug!(
            "event=owner_cat_upsert module=mapper owner_id={} cat_id={} created={}",
            owner.id, cat.id, created
        );
    }
    Ok(owner)
}

/// Renders an owner with all of its cats, ordered by id.
pub fn owner_to_repr<S: RecordStore>(
    store: &S,
    owner: &Owner,
    current_year: i32,
) -> RepoResult<OwnerRepr> {
    let cats = store
        .list_cats_by_owner(owner.id)?
        .iter()
        .map(|cat| cat_to_repr_with_owner(store, cat, owner, current_year))
        .collect::<RepoResult<Vec<_>>>()?;

    Ok(OwnerRepr {
        id: owner.id,
        first_name: owner.first_name.clone(),
        last_name: owner.last_name.clone(),
        full_name: owner.full_name(),
        cats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::color::CatColor;

    fn nested(name: Option<&str>, color: Option<&str>, birth_year: Option<i32>) -> CatPayload {
        CatPayload {
            name: name.map(|name| Some(name.to_string())),
            color: color.map(|color| Some(color.to_string())),
            birth_year: birth_year.map(Some),
            ..CatPayload::default()
        }
    }

    #[test]
    fn create_requires_names_and_full_nested_cats() {
        let payload = OwnerPayload {
            first_name: None,
            last_name: Some(Some("Smith".to_string())),
            cats: Some(Some(vec![
                nested(Some("Tom"), Some("black"), Some(2020)),
                nested(Some("Kit"), None, None),
            ])),
        };

        let errors = payload.validate_create().unwrap_err();
        let fields: Vec<&str> = errors.field_names().collect();
        assert_eq!(
            fields,
            vec!["cats[1].birth_year", "cats[1].color", "first_name"]
        );
    }

    #[test]
    fn create_rejects_nested_color_outside_choices() {
        let payload = OwnerPayload {
            first_name: Some(Some("Ann".to_string())),
            last_name: Some(Some("Smith".to_string())),
            cats: Some(Some(vec![nested(Some("Tom"), Some("plaid"), Some(2020))])),
        };

        let errors = payload.validate_create().unwrap_err();
        assert!(errors.contains("cats[0].color"));
    }

    #[test]
    fn create_ignores_nested_owner_and_achievements() {
        let payload: OwnerPayload = serde_json::from_value(serde_json::json!({
            "first_name": "Ann",
            "last_name": "Smith",
            "full_name": "ignored",
            "cats": [{
                "name": "Tom",
                "color": "black",
                "birth_year": 2020,
                "owner": "Nobody",
                "achievements": [{"achievement_name": "Best Mouser"}]
            }]
        }))
        .unwrap();

        let input = payload.validate_create().unwrap();
        assert_eq!(
            input.cats,
            vec![NestedCatCreate {
                name: "Tom".to_string(),
                color: CatColor::Black,
                birth_year: 2020,
            }]
        );
    }

    #[test]
    fn update_requires_only_nested_name() {
        let payload = OwnerPayload {
            cats: Some(Some(vec![
                nested(Some("Tom"), Some("white"), None),
                nested(None, None, Some(2019)),
            ])),
            ..OwnerPayload::default()
        };

        let errors = payload.validate_update().unwrap_err();
        let fields: Vec<&str> = errors.field_names().collect();
        assert_eq!(fields, vec!["cats[1].name"]);
    }

    #[test]
    fn update_rejects_explicit_nulls() {
        let payload: OwnerPayload = serde_json::from_value(serde_json::json!({
            "first_name": null,
            "cats": [{"name": "Tom", "birth_year": null}]
        }))
        .unwrap();

        let errors = payload.validate_update().unwrap_err();
        let fields: Vec<&str> = errors.field_names().collect();
        assert_eq!(fields, vec!["cats[0].birth_year", "first_name"]);
        assert_eq!(
            errors.field("first_name").unwrap(),
            ["This field may not be null.".to_string()]
        );
    }

    #[test]
    fn null_cats_list_is_rejected() {
        let payload: OwnerPayload = serde_json::from_value(serde_json::json!({
            "first_name": "Ann",
            "last_name": "Smith",
            "cats": null
        }))
        .unwrap();

        let errors = payload.validate_create().unwrap_err();
        assert!(errors.contains("cats"));
    }

    #[test]
    fn update_without_cats_is_valid() {
        let input = OwnerPayload::default().validate_update().unwrap();
        assert_eq!(input, OwnerUpdate::default());
    }
}
