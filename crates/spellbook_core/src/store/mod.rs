//! Record store: CRUD, soft-delete into trash, and offset pagination.
//!
//! Two backends implement [`SpellStore`]; which one runs is an explicit
//! [`StoreBackend`] choice made at startup.

/// JSON file pair backend (`spells.json` / `trash.json`).
pub mod json_file;
/// Embedded redb table backend.
pub mod table;
/// redb table definitions.
pub mod tables;


pub use json_file::JsonFileStore;
pub use table::TableStore;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;
use crate::models::{Spell, SpellDraft, SpellPage, SpellPatch, TrashEntry};
use std::path::Path;
use std::sync::Arc;

/// Persistence contract shared by every storage backend.
///
/// Lookups that miss return `Ok(None)`; callers translate that into
/// [`AppError::NotFound`] at the boundary. Every mutation is whole-or-nothing
/// for the record it touches.
pub trait SpellStore: Send + Sync {
    /// Which implementation is serving requests.
    fn backend(&self) -> StoreBackend;

    /// Live records newest-first, sliced to `[offset, offset + limit)`.
    ///
    /// `total` is the full live count regardless of the slice. An offset past
    /// the end yields an empty page.
    ///
    /// # Errors
    /// Returns an error when storage access or decoding fails.
    fn list(&self, limit: usize, offset: usize) -> Result<SpellPage, AppError>;

    /// Fetch a live record by id.
    ///
    /// # Errors
    /// Returns an error when storage access or decoding fails.
    fn get(&self, id: &str) -> Result<Option<Spell>, AppError>;

    /// Insert a new record built from `draft`.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for a blank name, or a storage error.
    fn create(&self, draft: SpellDraft) -> Result<Spell, AppError>;

    /// Merge `patch` over an existing record.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for a blank name, or a storage error.
    fn update(&self, id: &str, patch: &SpellPatch) -> Result<Option<Spell>, AppError>;

    /// Move a live record into the trash and return it as it was.
    ///
    /// # Errors
    /// Returns an error when storage access or encoding fails.
    fn delete(&self, id: &str) -> Result<Option<Spell>, AppError>;

    /// Move a trash entry back into the live set.
    ///
    /// # Errors
    /// Returns [`AppError::Conflict`] when a live record already uses the id.
    fn restore(&self, id: &str) -> Result<Option<Spell>, AppError>;

    /// Trash entries, most recently deleted first.
    ///
    /// # Errors
    /// Returns an error when storage access or decoding fails.
    fn list_trash(&self) -> Result<Vec<TrashEntry>, AppError>;

    /// Number of live records.
    ///
    /// # Errors
    /// Returns an error when storage access fails.
    fn count(&self) -> Result<usize, AppError>;
}

/// Open the backend named by `config.store` inside `config.data_dir`.
///
/// # Errors
/// Returns an error when the data directory or backend files cannot be opened.
pub fn open_store(config: &Config) -> Result<Arc<dyn SpellStore>, AppError> {
    open_backend(config.store, &config.data_dir)
}

/// Open a specific backend inside `data_dir`.
///
/// # Errors
/// Returns an error when the data directory or backend files cannot be opened.
pub fn open_backend(backend: StoreBackend, data_dir: &Path) -> Result<Arc<dyn SpellStore>, AppError> {
    let store: Arc<dyn SpellStore> = match backend {
        StoreBackend::JsonFile => Arc::new(JsonFileStore::open(data_dir)?),
        StoreBackend::Table => Arc::new(TableStore::open(data_dir)?),
    };
    tracing::debug!(
        "Opened {} store at {}",
        store.backend(),
        data_dir.display()
    );
    Ok(store)
}

/// Most recently deleted first; ties fall back to id for a stable order.
pub(crate) fn sort_trash(entries: &mut [TrashEntry]) {
    entries.sort_by(|a, b| {
        b.deleted_at
            .cmp(&a.deleted_at)
            .then_with(|| a.spell.id.cmp(&b.spell.id))
    });
}
