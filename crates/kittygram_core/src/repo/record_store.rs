//! Record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Expose the create / get-or-create / get / save / clear-relation
//!   operations the mappers need, per entity.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Lookups that must resolve to one row fail with `MultipleMatches` when
//!   more than one row matches; they never pick one silently.
//! - Read paths reject persisted colors outside `CatColor::ALL`.
//! - The store never opens transactions; callers own the boundary.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::achievement::{Achievement, AchievementCat, AchievementId};
use crate::model::cat::{Cat, CatId, NewCat};
use crate::model::color::CatColor;
use crate::model::owner::{NewOwner, Owner, OwnerId};
use rusqlite::{params, Connection, Params, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CAT_SELECT_SQL: &str = "SELECT id, name, color, birth_year, owner_id FROM cats";
const OWNER_SELECT_SQL: &str = "SELECT id, first_name, last_name FROM owners";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from record store operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target row does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// A lookup expected to be unique matched several rows.
    MultipleMatches {
        entity: &'static str,
        lookup: String,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::MultipleMatches { entity, lookup } => {
                write!(f, "more than one {entity} matches {lookup}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record store requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence operations required by the mappers.
pub trait RecordStore {
    /// Inserts one achievement.
    fn create_achievement(&self, name: &str) -> RepoResult<Achievement>;
    /// Returns the achievement named `name`, inserting it when absent.
    /// The flag is `true` when a row was inserted.
    fn get_or_create_achievement(&self, name: &str) -> RepoResult<(Achievement, bool)>;
    /// Lists every achievement ordered by id.
    fn list_achievements(&self) -> RepoResult<Vec<Achievement>>;

    /// Links one achievement to one cat.
    fn create_achievement_cat(
        &self,
        achievement_id: AchievementId,
        cat_id: CatId,
    ) -> RepoResult<AchievementCat>;
    /// Removes every achievement link of a cat. Returns removed link count.
    fn clear_cat_achievements(&self, cat_id: CatId) -> RepoResult<usize>;
    /// Achievements linked to a cat in link order, one entry per link.
    fn cat_achievements(&self, cat_id: CatId) -> RepoResult<Vec<Achievement>>;

    fn create_cat(&self, cat: &NewCat) -> RepoResult<Cat>;
    fn get_cat(&self, id: CatId) -> RepoResult<Option<Cat>>;
    /// Returns the cat named `cat.name` owned by `cat.owner_id`, inserting
    /// `cat` when there is none.
    fn get_or_create_cat(&self, cat: &NewCat) -> RepoResult<(Cat, bool)>;
    /// Persists all scalar fields of an existing cat.
    fn save_cat(&self, cat: &Cat) -> RepoResult<()>;
    fn list_cats(&self) -> RepoResult<Vec<Cat>>;
    fn list_cats_by_owner(&self, owner_id: OwnerId) -> RepoResult<Vec<Cat>>;
    fn delete_cat(&self, id: CatId) -> RepoResult<()>;

    fn create_owner(&self, owner: &NewOwner) -> RepoResult<Owner>;
    fn get_owner(&self, id: OwnerId) -> RepoResult<Option<Owner>>;
    /// Resolves an owner by last name.
    fn get_owner_by_last_name(&self, last_name: &str) -> RepoResult<Option<Owner>>;
    fn save_owner(&self, owner: &Owner) -> RepoResult<()>;
    fn list_owners(&self) -> RepoResult<Vec<Owner>>;
    /// Deletes an owner together with its cats.
    fn delete_owner(&self, id: OwnerId) -> RepoResult<()>;
}

/// SQLite-backed record store.
///
/// Accepts a plain connection or a `Transaction` (through deref).
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Creates a store from a fully migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version = current_version(conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    fn query_cats<P: Params>(&self, filter: &str, params: P) -> RepoResult<Vec<Cat>> {
        let mut stmt = self.conn.prepare(&format!("{CAT_SELECT_SQL} {filter}"))?;
        let mut rows = stmt.query(params)?;
        let mut cats = Vec::new();
        while let Some(row) = rows.next()? {
            cats.push(parse_cat_row(row)?);
        }
        Ok(cats)
    }

    fn query_owners<P: Params>(&self, filter: &str, params: P) -> RepoResult<Vec<Owner>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{OWNER_SELECT_SQL} {filter}"))?;
        let mut rows = stmt.query(params)?;
        let mut owners = Vec::new();
        while let Some(row) = rows.next()? {
            owners.push(parse_owner_row(row)?);
        }
        Ok(owners)
    }

    fn query_achievements<P: Params>(&self, sql: &str, params: P) -> RepoResult<Vec<Achievement>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut achievements = Vec::new();
        while let Some(row) = rows.next()? {
            achievements.push(Achievement {
                id: row.get("id")?,
                name: row.get("name")?,
            });
        }
        Ok(achievements)
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn create_achievement(&self, name: &str) -> RepoResult<Achievement> {
        self.conn
            .execute("INSERT INTO achievements (name) VALUES (?1);", [name])?;
        Ok(Achievement {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    fn get_or_create_achievement(&self, name: &str) -> RepoResult<(Achievement, bool)> {
        let matches = self.query_achievements(
            "SELECT id, name FROM achievements WHERE name = ?1 ORDER BY id ASC LIMIT 2;",
            [name],
        )?;
        match at_most_one(matches, "achievement", || format!("name={name}"))? {
            Some(existing) => Ok((existing, false)),
            None => Ok((self.create_achievement(name)?, true)),
        }
    }

    fn list_achievements(&self) -> RepoResult<Vec<Achievement>> {
        self.query_achievements("SELECT id, name FROM achievements ORDER BY id ASC;", [])
    }

    fn create_achievement_cat(
        &self,
        achievement_id: AchievementId,
        cat_id: CatId,
    ) -> RepoResult<AchievementCat> {
        self.conn.execute(
            "INSERT INTO achievement_cats (achievement_id, cat_id) VALUES (?1, ?2);",
            params![achievement_id, cat_id],
        )?;
        Ok(AchievementCat {
            id: self.conn.last_insert_rowid(),
            achievement_id,
            cat_id,
        })
    }

    fn clear_cat_achievements(&self, cat_id: CatId) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM achievement_cats WHERE cat_id = ?1;", [cat_id])?;
        Ok(removed)
    }

    fn cat_achievements(&self, cat_id: CatId) -> RepoResult<Vec<Achievement>> {
        self.query_achievements(
            "SELECT a.id, a.name
             FROM achievement_cats ac
             INNER JOIN achievements a ON a.id = ac.achievement_id
             WHERE ac.cat_id = ?1
             ORDER BY ac.id ASC;",
            [cat_id],
        )
    }

    fn create_cat(&self, cat: &NewCat) -> RepoResult<Cat> {
        self.conn.execute(
            "INSERT INTO cats (name, color, birth_year, owner_id) VALUES (?1, ?2, ?3, ?4);",
            params![cat.name, cat.color.as_str(), cat.birth_year, cat.owner_id],
        )?;
        Ok(Cat {
            id: self.conn.last_insert_rowid(),
            name: cat.name.clone(),
            color: cat.color,
            birth_year: cat.birth_year,
            owner_id: cat.owner_id,
        })
    }

    fn get_cat(&self, id: CatId) -> RepoResult<Option<Cat>> {
        Ok(self.query_cats("WHERE id = ?1;", [id])?.pop())
    }

    fn get_or_create_cat(&self, cat: &NewCat) -> RepoResult<(Cat, bool)> {
        let matches = self.query_cats(
            "WHERE name = ?1 AND owner_id = ?2 ORDER BY id ASC LIMIT 2;",
            params![cat.name, cat.owner_id],
        )?;
        let lookup = || format!("name={} owner_id={}", cat.name, cat.owner_id);
        match at_most_one(matches, "cat", lookup)? {
            Some(existing) => Ok((existing, false)),
            None => Ok((self.create_cat(cat)?, true)),
        }
    }

    fn save_cat(&self, cat: &Cat) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE cats
             SET
                name = ?1,
                color = ?2,
                birth_year = ?3,
                owner_id = ?4
             WHERE id = ?5;",
            params![
                cat.name,
                cat.color.as_str(),
                cat.birth_year,
                cat.owner_id,
                cat.id,
            ],
        )?;
        ensure_changed(changed, "cat", cat.id)
    }

    fn list_cats(&self) -> RepoResult<Vec<Cat>> {
        self.query_cats("ORDER BY id ASC;", [])
    }

    fn list_cats_by_owner(&self, owner_id: OwnerId) -> RepoResult<Vec<Cat>> {
        self.query_cats("WHERE owner_id = ?1 ORDER BY id ASC;", [owner_id])
    }

    fn delete_cat(&self, id: CatId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM cats WHERE id = ?1;", [id])?;
        ensure_changed(changed, "cat", id)
    }

    fn create_owner(&self, owner: &NewOwner) -> RepoResult<Owner> {
        self.conn.execute(
            "INSERT INTO owners (first_name, last_name) VALUES (?1, ?2);",
            params![owner.first_name, owner.last_name],
        )?;
        Ok(Owner {
            id: self.conn.last_insert_rowid(),
            first_name: owner.first_name.clone(),
            last_name: owner.last_name.clone(),
        })
    }

    fn get_owner(&self, id: OwnerId) -> RepoResult<Option<Owner>> {
        Ok(self.query_owners("WHERE id = ?1;", [id])?.pop())
    }

    fn get_owner_by_last_name(&self, last_name: &str) -> RepoResult<Option<Owner>> {
        let matches =
            self.query_owners("WHERE last_name = ?1 ORDER BY id ASC LIMIT 2;", [last_name])?;
        at_most_one(matches, "owner", || format!("last_name={last_name}"))
    }

    fn save_owner(&self, owner: &Owner) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE owners SET first_name = ?1, last_name = ?2 WHERE id = ?3;",
            params![owner.first_name, owner.last_name, owner.id],
        )?;
        ensure_changed(changed, "owner", owner.id)
    }

    fn list_owners(&self) -> RepoResult<Vec<Owner>> {
        self.query_owners("ORDER BY id ASC;", [])
    }

    fn delete_owner(&self, id: OwnerId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM owners WHERE id = ?1;", [id])?;
        ensure_changed(changed, "owner", id)
    }
}

fn at_most_one<T>(
    mut matches: Vec<T>,
    entity: &'static str,
    lookup: impl FnOnce() -> String,
) -> RepoResult<Option<T>> {
    if matches.len() > 1 {
        return Err(RepoError::MultipleMatches {
            entity,
            lookup: lookup(),
        });
    }
    Ok(matches.pop())
}

fn ensure_changed(changed: usize, entity: &'static str, id: i64) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound { entity, id });
    }
    Ok(())
}

fn parse_cat_row(row: &Row<'_>) -> RepoResult<Cat> {
    let id: CatId = row.get("id")?;
    let color_text: String = row.get("color")?;
    let color = CatColor::parse(&color_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid color `{color_text}` in cats.color (id {id})"))
    })?;

    Ok(Cat {
        id,
        name: row.get("name")?,
        color,
        birth_year: row.get("birth_year")?,
        owner_id: row.get("owner_id")?,
    })
}

fn parse_owner_row(row: &Row<'_>) -> RepoResult<Owner> {
    Ok(Owner {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
    })
}
