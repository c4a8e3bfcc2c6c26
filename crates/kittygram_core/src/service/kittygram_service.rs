//! Cat/owner/achievement use-case service.
//!
//! # Responsibility
//! - Expose create/update/get/list/delete operations in wire form.
//! - Run every write inside a single `IMMEDIATE` transaction so nested
//!   sequences commit fully or not at all.
//!
//! # Invariants
//! - Validation (including owner lookup) finishes before the first write.
//! - Age is computed from the year source on every read, never cached.
//! - Logs carry ids and counts only, never names.

use crate::db::DbError;
use crate::mapper::achievement::AchievementRepr;
use crate::mapper::cat::{self as cat_mapper, CatPayload, CatRepr};
use crate::mapper::cat_summary::{CatSummary, CatSummaryFilter};
use crate::mapper::owner::{self as owner_mapper, OwnerPayload, OwnerRepr};
use crate::mapper::MapperError;
use crate::model::cat::{current_year, CatId};
use crate::model::owner::OwnerId;
use crate::repo::record_store::{RecordStore, RepoError, SqliteRecordStore};
use crate::validation::ValidationErrors;
use log::{error, info, warn};
use rusqlite::{Connection, TransactionBehavior};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for cat/owner use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Payload failed field validation; nothing was written.
    Validation(ValidationErrors),
    /// Payload JSON does not match the expected shape.
    Malformed(serde_json::Error),
    CatNotFound(CatId),
    OwnerNotFound(OwnerId),
    /// A lookup that must be unique matched several records.
    Lookup {
        entity: &'static str,
        lookup: String,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ServiceError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Malformed(_) => "malformed_payload",
            Self::CatNotFound(_) => "cat_not_found",
            Self::OwnerNotFound(_) => "owner_not_found",
            Self::Lookup { .. } => "ambiguous_lookup",
            Self::Repo(_) => "store_failed",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::Malformed(err) => write!(f, "malformed payload: {err}"),
            Self::CatNotFound(id) => write!(f, "cat not found: {id}"),
            Self::OwnerNotFound(id) => write!(f, "owner not found: {id}"),
            Self::Lookup { entity, lookup } => {
                write!(f, "more than one {entity} matches {lookup}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Malformed(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "cat", id } => Self::CatNotFound(id),
            RepoError::NotFound {
                entity: "owner",
                id,
            } => Self::OwnerNotFound(id),
            RepoError::MultipleMatches { entity, lookup } => Self::Lookup { entity, lookup },
            other => Self::Repo(other),
        }
    }
}

impl From<MapperError> for ServiceError {
    fn from(value: MapperError) -> Self {
        match value {
            MapperError::Validation(errors) => Self::Validation(errors),
            MapperError::Repo(err) => err.into(),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Parses a JSON payload into one of the `*Payload` shapes.
pub fn parse_payload<T: DeserializeOwned>(json: &str) -> ServiceResult<T> {
    serde_json::from_str(json).map_err(ServiceError::Malformed)
}

/// Service facade over a migrated SQLite connection.
pub struct KittygramService<'conn> {
    conn: &'conn mut Connection,
    year_source: fn() -> i32,
}

impl<'conn> KittygramService<'conn> {
    /// Creates a service that derives ages from the local wall clock.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self::with_year_source(conn, current_year)
    }

    /// Creates a service with an explicit current-year source.
    pub fn with_year_source(conn: &'conn mut Connection, year_source: fn() -> i32) -> Self {
        Self { conn, year_source }
    }

    /// Validates and creates one cat with its achievements.
    pub fn create_cat(&mut self, payload: CatPayload) -> ServiceResult<CatRepr> {
        let year = (self.year_source)();
        self.write("cat_create", |store| {
            let input = payload.validate_create(store)?;
            let cat = cat_mapper::create_cat(store, input)?;
            Ok(cat_mapper::cat_to_repr(store, &cat, year)?)
        })
    }

    /// Applies a partial update to one cat.
    pub fn update_cat(&mut self, id: CatId, payload: CatPayload) -> ServiceResult<CatRepr> {
        let year = (self.year_source)();
        self.write("cat_update", |store| {
            let cat = store.get_cat(id)?.ok_or(ServiceError::CatNotFound(id))?;
            let input = payload.validate_update(store)?;
            let cat = cat_mapper::update_cat(store, cat, input)?;
            Ok(cat_mapper::cat_to_repr(store, &cat, year)?)
        })
    }

    pub fn get_cat(&self, id: CatId) -> ServiceResult<Option<CatRepr>> {
        let store = self.store()?;
        match store.get_cat(id)? {
            Some(cat) => Ok(Some(cat_mapper::cat_to_repr(
                &store,
                &cat,
                (self.year_source)(),
            )?)),
            None => Ok(None),
        }
    }

    /// Lists cat summaries ordered by id.
    pub fn list_cats(&self, filter: &CatSummaryFilter) -> ServiceResult<Vec<CatSummary>> {
        let store = self.store()?;
        Ok(store
            .list_cats()?
            .iter()
            .filter(|cat| filter.matches(cat))
            .map(CatSummary::from)
            .collect())
    }

    /// Deletes one cat and its achievement links.
    pub fn delete_cat(&mut self, id: CatId) -> ServiceResult<()> {
        self.write("cat_delete", |store| Ok(store.delete_cat(id)?))
    }

    /// Validates and creates one owner with its nested cats.
    pub fn create_owner(&mut self, payload: OwnerPayload) -> ServiceResult<OwnerRepr> {
        let year = (self.year_source)();
        self.write("owner_create", |store| {
            let input = payload.validate_create()?;
            let owner = owner_mapper::create_owner(store, input)?;
            Ok(owner_mapper::owner_to_repr(store, &owner, year)?)
        })
    }

    /// Updates owner names and upserts nested cats by name.
    pub fn update_owner(
        &mut self,
        id: OwnerId,
        payload: OwnerPayload,
    ) -> ServiceResult<OwnerRepr> {
        let year = (self.year_source)();
        self.write("owner_update", |store| {
            let owner = store
                .get_owner(id)?
                .ok_or(ServiceError::OwnerNotFound(id))?;
            let input = payload.validate_update()?;
            let owner = owner_mapper::update_owner(store, owner, input, year)?;
            Ok(owner_mapper::owner_to_repr(store, &owner, year)?)
        })
    }

    pub fn get_owner(&self, id: OwnerId) -> ServiceResult<Option<OwnerRepr>> {
        let store = self.store()?;
        match store.get_owner(id)? {
            Some(owner) => Ok(Some(owner_mapper::owner_to_repr(
                &store,
                &owner,
                (self.year_source)(),
            )?)),
            None => Ok(None),
        }
    }

    /// Lists owners with their cats, ordered by id.
    pub fn list_owners(&self) -> ServiceResult<Vec<OwnerRepr>> {
        let store = self.store()?;
        let year = (self.year_source)();
        store
            .list_owners()?
            .iter()
            .map(|owner| {
                owner_mapper::owner_to_repr(&store, owner, year).map_err(ServiceError::from)
            })
            .collect()
    }

    /// Deletes one owner; its cats go with it.
    pub fn delete_owner(&mut self, id: OwnerId) -> ServiceResult<()> {
        self.write("owner_delete", |store| Ok(store.delete_owner(id)?))
    }

    pub fn list_achievements(&self) -> ServiceResult<Vec<AchievementRepr>> {
        let store = self.store()?;
        Ok(store
            .list_achievements()?
            .iter()
            .map(AchievementRepr::from)
            .collect())
    }

    fn store(&self) -> ServiceResult<SqliteRecordStore<'_>> {
        Ok(SqliteRecordStore::try_new(&*self.conn)?)
    }

    fn write<T>(
        &mut self,
        event: &'static str,
        op: impl FnOnce(&SqliteRecordStore<'_>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let started_at = Instant::now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let outcome = SqliteRecordStore::try_new(&tx)
            .map_err(ServiceError::from)
            .and_then(|store| op(&store));

        // Dropping `tx` without commit rolls back every write of `op`.
        let result = outcome.and_then(|value| {
            tx.commit()?;
            Ok(value)
        });

        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
            Err(err @ (ServiceError::Validation(_) | ServiceError::Malformed(_))) => warn!(
                "event={event} module=service status=rejected duration_ms={duration_ms} error_code={}",
                err.code()
            ),
            Err(err) => error!(
                "event={event} module=service status=error duration_ms={duration_ms} error_code={}",
                err.code()
            ),
        }
        result
    }
}
