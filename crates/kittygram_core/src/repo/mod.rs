//! Record store abstraction and SQLite implementation.
//!
//! # Responsibility
//! - Define the data access contract used by the mappers.
//! - Isolate SQLite query details from mapping and orchestration.

pub mod record_store;
