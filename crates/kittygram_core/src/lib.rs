//! Core of the cat registry: owners, their cats and the cats' achievements.
//! Wire mapping, validation and nested upserts over a SQLite record store.

pub mod config;
pub mod db;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use mapper::achievement::{AchievementPayload, AchievementRepr};
pub use mapper::cat::{CatPayload, CatRepr};
pub use mapper::cat_summary::{CatSummary, CatSummaryFilter, CatSummaryPayload};
pub use mapper::owner::{OwnerPayload, OwnerRepr};
pub use mapper::MapperError;
pub use model::achievement::{Achievement, AchievementCat, AchievementId};
pub use model::cat::{current_year, Cat, CatId, NewCat};
pub use model::color::CatColor;
pub use model::owner::{NewOwner, Owner, OwnerId};
pub use repo::record_store::{RecordStore, RepoError, RepoResult, SqliteRecordStore};
pub use service::kittygram_service::{
    parse_payload, KittygramService, ServiceError, ServiceResult,
};
pub use validation::ValidationErrors;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
