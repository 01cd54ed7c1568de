//! HTTP request handlers.

/// Liveness endpoint.
pub mod health;
pub(crate) mod pagination;
/// Spell CRUD endpoints.
pub mod spell;
/// Trash listing and restore endpoints.
pub mod trash;
