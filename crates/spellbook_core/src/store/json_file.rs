//! Spell storage backed by a `spells.json` / `trash.json` file pair.

use super::{sort_trash, SpellStore};
use crate::config::StoreBackend;
use crate::constants::{SPELLS_FILE_NAME, TRASH_FILE_NAME};
use crate::error::AppError;
use crate::models::spell::sort_newest_first;
use crate::models::validation::{validate_draft, validate_patch};
use crate::models::{Spell, SpellDraft, SpellPage, SpellPatch, TrashEntry};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Collections {
    /// Kept in newest-first order.
    spells: Vec<Spell>,
    trash: Vec<TrashEntry>,
}

/// File-backed store with an in-memory cache of both collections.
///
/// The cache is only replaced after the corresponding file write succeeded, so
/// an I/O failure leaves previously loaded state intact.
pub struct JsonFileStore {
    spells_path: PathBuf,
    trash_path: PathBuf,
    state: RwLock<Collections>,
}

fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AppError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw).map_err(|err| {
        AppError::Backend(format!(
            "{} is not a valid spell collection: {}",
            path.display(),
            err
        ))
    })
}

/// Write through a sibling temp file and rename over the target.
fn write_collection<T: Serialize>(path: &Path, items: &[T]) -> Result<(), AppError> {
    let encoded = serde_json::to_vec_pretty(items)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, encoded)?;
    if let Err(err) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

impl JsonFileStore {
    /// Open (or initialize) the file pair inside `data_dir`.
    ///
    /// Missing files are treated as empty collections. A file that exists but
    /// does not parse is an error; it is never silently replaced.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created or a file is
    /// unreadable or malformed.
    pub fn open(data_dir: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(data_dir)?;
        let spells_path = data_dir.join(SPELLS_FILE_NAME);
        let trash_path = data_dir.join(TRASH_FILE_NAME);

        let mut spells: Vec<Spell> = load_collection(&spells_path)?;
        let mut trash: Vec<TrashEntry> = load_collection(&trash_path)?;
        sort_newest_first(&mut spells);
        sort_trash(&mut trash);

        Ok(Self {
            spells_path,
            trash_path,
            state: RwLock::new(Collections { spells, trash }),
        })
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, Collections>, AppError> {
        self.state
            .read()
            .map_err(|_| AppError::Backend("Spell cache lock is poisoned".to_string()))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, Collections>, AppError> {
        self.state
            .write()
            .map_err(|_| AppError::Backend("Spell cache lock is poisoned".to_string()))
    }

    /// Persist both collections, restoring `previous_spells` on disk if the
    /// trash write fails after the spells write succeeded.
    fn persist_move(
        &self,
        next_spells: &[Spell],
        next_trash: &[TrashEntry],
        previous_spells: &[Spell],
    ) -> Result<(), AppError> {
        write_collection(&self.spells_path, next_spells)?;
        if let Err(err) = write_collection(&self.trash_path, next_trash) {
            if let Err(rollback_err) = write_collection(&self.spells_path, previous_spells) {
                tracing::error!("Failed to roll back spells file: {}", rollback_err);
            }
            return Err(err);
        }
        Ok(())
    }
}

impl SpellStore for JsonFileStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::JsonFile
    }

    fn list(&self, limit: usize, offset: usize) -> Result<SpellPage, AppError> {
        let state = self.read_state()?;
        let items = state
            .spells
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(SpellPage {
            items,
            total: state.spells.len(),
        })
    }

    fn get(&self, id: &str) -> Result<Option<Spell>, AppError> {
        let state = self.read_state()?;
        Ok(state.spells.iter().find(|spell| spell.id == id).cloned())
    }

    fn create(&self, draft: SpellDraft) -> Result<Spell, AppError> {
        validate_draft(&draft)?;
        let spell = Spell::new(draft);

        let mut state = self.write_state()?;
        let mut next = state.spells.clone();
        next.push(spell.clone());
        sort_newest_first(&mut next);
        write_collection(&self.spells_path, &next)?;
        state.spells = next;
        Ok(spell)
    }

    fn update(&self, id: &str, patch: &SpellPatch) -> Result<Option<Spell>, AppError> {
        validate_patch(patch)?;
        let mut state = self.write_state()?;
        let Some(index) = state.spells.iter().position(|spell| spell.id == id) else {
            return Ok(None);
        };

        let mut updated = state.spells[index].clone();
        updated.apply_patch(patch);
        let mut next = state.spells.clone();
        next[index] = updated.clone();
        write_collection(&self.spells_path, &next)?;
        state.spells = next;
        Ok(Some(updated))
    }

    fn delete(&self, id: &str) -> Result<Option<Spell>, AppError> {
        let mut state = self.write_state()?;
        let Some(index) = state.spells.iter().position(|spell| spell.id == id) else {
            return Ok(None);
        };

        let mut next_spells = state.spells.clone();
        let removed = next_spells.remove(index);
        let mut next_trash = state.trash.clone();
        next_trash.push(TrashEntry::new(removed.clone()));
        sort_trash(&mut next_trash);

        self.persist_move(&next_spells, &next_trash, &state.spells)?;
        state.spells = next_spells;
        state.trash = next_trash;
        Ok(Some(removed))
    }

    fn restore(&self, id: &str) -> Result<Option<Spell>, AppError> {
        let mut state = self.write_state()?;
        let Some(index) = state.trash.iter().position(|entry| entry.spell.id == id) else {
            return Ok(None);
        };
        if state.spells.iter().any(|spell| spell.id == id) {
            return Err(AppError::Conflict(format!(
                "A live spell with id '{}' already exists",
                id
            )));
        }

        let mut next_trash = state.trash.clone();
        let restored = next_trash.remove(index).into_spell();
        let mut next_spells = state.spells.clone();
        next_spells.push(restored.clone());
        sort_newest_first(&mut next_spells);

        self.persist_move(&next_spells, &next_trash, &state.spells)?;
        state.spells = next_spells;
        state.trash = next_trash;
        Ok(Some(restored))
    }

    fn list_trash(&self) -> Result<Vec<TrashEntry>, AppError> {
        Ok(self.read_state()?.trash.clone())
    }

    fn count(&self) -> Result<usize, AppError> {
        Ok(self.read_state()?.spells.len())
    }
}
