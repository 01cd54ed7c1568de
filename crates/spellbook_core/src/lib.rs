//! Core domain library for Spellbook (config, models, storage backends).

/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across Spellbook crates.
pub mod constants;
/// Application error types (storage/domain).
pub mod error;
/// Data models for API requests and persistence.
pub mod models;
/// Record store trait and its backends.
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{Config, StoreBackend};
pub use constants::{
    DEFAULT_CLIENT_API_URL, DEFAULT_LIST_LIMIT, DEFAULT_PORT, MAX_LIST_LIMIT,
};
pub use error::AppError;
pub use store::{open_store, SpellStore};
