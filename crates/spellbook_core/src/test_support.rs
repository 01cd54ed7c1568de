//! Shared test-only helpers for spellbook_core.

use crate::config::StoreBackend;
use crate::models::{Element, SpellDraft};
use crate::store::{open_backend, SpellStore};
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) const ALL_BACKENDS: [StoreBackend; 2] = [StoreBackend::JsonFile, StoreBackend::Table];

/// Opens `backend` in a fresh temporary data directory.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing files.
///
/// # Panics
/// Panics if temp-dir creation or store initialization fails.
pub(crate) fn setup_temp_store(backend: StoreBackend) -> (Arc<dyn SpellStore>, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let store = open_backend(backend, temp_dir.path()).expect("open store");
    (store, temp_dir)
}

pub(crate) fn draft(name: &str) -> SpellDraft {
    SpellDraft {
        name: name.to_string(),
        ..SpellDraft::default()
    }
}

pub(crate) fn element_draft(name: &str, element: Element) -> SpellDraft {
    SpellDraft {
        element,
        ..draft(name)
    }
}
