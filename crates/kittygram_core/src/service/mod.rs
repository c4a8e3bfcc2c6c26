//! Core use-case services.
//!
//! # Responsibility
//! - Wrap each mapper call in one storage transaction.
//! - Keep callers (CLI, web adapters) decoupled from storage details.

pub mod kittygram_service;
