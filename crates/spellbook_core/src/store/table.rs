//! Spell storage backed by embedded redb tables.

use super::tables::{SPELLS, SPELLS_BY_CREATED, TRASH};
use super::{sort_trash, SpellStore};
use crate::config::StoreBackend;
use crate::constants::TABLE_DB_FILE_NAME;
use crate::error::AppError;
use crate::models::spell::reverse_created_key;
use crate::models::validation::{validate_draft, validate_patch};
use crate::models::{Spell, SpellDraft, SpellPage, SpellPatch, TrashEntry};
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};
use std::path::Path;

fn encode_spell(spell: &Spell) -> Result<Vec<u8>, AppError> {
    Ok(bincode::serialize(spell)?)
}

fn decode_spell(bytes: &[u8]) -> Result<Spell, AppError> {
    Ok(bincode::deserialize(bytes)?)
}

fn encode_trash(entry: &TrashEntry) -> Result<Vec<u8>, AppError> {
    Ok(bincode::serialize(&(&entry.spell, &entry.deleted_at))?)
}

fn decode_trash(bytes: &[u8]) -> Result<TrashEntry, AppError> {
    let (spell, deleted_at): (Spell, DateTime<Utc>) = bincode::deserialize(bytes)?;
    Ok(TrashEntry { spell, deleted_at })
}

/// Table-backed store: one redb write transaction per mutation.
pub struct TableStore {
    db: redb::Database,
}

impl TableStore {
    /// Open (or create) `spellbook.redb` inside `data_dir` and ensure tables exist.
    ///
    /// # Errors
    /// Returns an error when the directory, database file, or tables cannot be
    /// opened.
    pub fn open(data_dir: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(data_dir)?;
        let db = redb::Database::create(data_dir.join(TABLE_DB_FILE_NAME))?;

        let write_txn = db.begin_write()?;
        write_txn.open_table(SPELLS)?;
        write_txn.open_table(SPELLS_BY_CREATED)?;
        write_txn.open_table(TRASH)?;
        write_txn.commit()?;
        Ok(Self { db })
    }
}

impl SpellStore for TableStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Table
    }

    fn list(&self, limit: usize, offset: usize) -> Result<SpellPage, AppError> {
        let read_txn = self.db.begin_read()?;
        let spells = read_txn.open_table(SPELLS)?;
        let index = read_txn.open_table(SPELLS_BY_CREATED)?;
        let total = spells.len()? as usize;

        let mut items = Vec::with_capacity(limit.min(total));
        for entry in index.iter()?.skip(offset).take(limit) {
            let (key, _) = entry?;
            let (_, id) = key.value();
            let Some(row) = spells.get(id)? else {
                tracing::warn!("Recency index references missing spell {}", id);
                continue;
            };
            items.push(decode_spell(row.value())?);
        }

        Ok(SpellPage { items, total })
    }

    fn get(&self, id: &str) -> Result<Option<Spell>, AppError> {
        let read_txn = self.db.begin_read()?;
        let spells = read_txn.open_table(SPELLS)?;
        match spells.get(id)? {
            Some(row) => Ok(Some(decode_spell(row.value())?)),
            None => Ok(None),
        }
    }

    fn create(&self, draft: SpellDraft) -> Result<Spell, AppError> {
        validate_draft(&draft)?;
        let spell = Spell::new(draft);
        let encoded = encode_spell(&spell)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut spells = write_txn.open_table(SPELLS)?;
            let mut index = write_txn.open_table(SPELLS_BY_CREATED)?;
            if spells.get(spell.id.as_str())?.is_some() {
                return Err(AppError::Conflict(format!(
                    "Spell id '{}' already exists",
                    spell.id
                )));
            }
            spells.insert(spell.id.as_str(), encoded.as_slice())?;
            index.insert(
                (reverse_created_key(spell.created_at), spell.id.as_str()),
                (),
            )?;
        }
        write_txn.commit()?;
        Ok(spell)
    }

    fn update(&self, id: &str, patch: &SpellPatch) -> Result<Option<Spell>, AppError> {
        validate_patch(patch)?;
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut spells = write_txn.open_table(SPELLS)?;
            let Some(row) = spells.get(id)? else {
                return Ok(None);
            };
            let mut spell = decode_spell(row.value())?;
            drop(row);

            // created_at is immutable, so the recency index row stays valid.
            spell.apply_patch(patch);
            let encoded = encode_spell(&spell)?;
            spells.insert(id, encoded.as_slice())?;
            spell
        };
        write_txn.commit()?;
        Ok(Some(updated))
    }

    fn delete(&self, id: &str) -> Result<Option<Spell>, AppError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut spells = write_txn.open_table(SPELLS)?;
            let mut index = write_txn.open_table(SPELLS_BY_CREATED)?;
            let mut trash = write_txn.open_table(TRASH)?;

            let Some(row) = spells.get(id)? else {
                return Ok(None);
            };
            let spell = decode_spell(row.value())?;
            drop(row);

            let entry = TrashEntry::new(spell.clone());
            let encoded = encode_trash(&entry)?;
            let _ = spells.remove(id)?;
            let _ = index.remove((reverse_created_key(spell.created_at), id))?;
            trash.insert(id, encoded.as_slice())?;
            spell
        };
        write_txn.commit()?;
        Ok(Some(removed))
    }

    fn restore(&self, id: &str) -> Result<Option<Spell>, AppError> {
        let write_txn = self.db.begin_write()?;
        let restored = {
            let mut spells = write_txn.open_table(SPELLS)?;
            let mut index = write_txn.open_table(SPELLS_BY_CREATED)?;
            let mut trash = write_txn.open_table(TRASH)?;

            let Some(row) = trash.get(id)? else {
                return Ok(None);
            };
            let spell = decode_trash(row.value())?.into_spell();
            drop(row);

            if spells.get(id)?.is_some() {
                return Err(AppError::Conflict(format!(
                    "A live spell with id '{}' already exists",
                    id
                )));
            }

            let encoded = encode_spell(&spell)?;
            let _ = trash.remove(id)?;
            spells.insert(id, encoded.as_slice())?;
            index.insert((reverse_created_key(spell.created_at), id), ())?;
            spell
        };
        write_txn.commit()?;
        Ok(Some(restored))
    }

    fn list_trash(&self) -> Result<Vec<TrashEntry>, AppError> {
        let read_txn = self.db.begin_read()?;
        let trash = read_txn.open_table(TRASH)?;
        let mut entries = Vec::new();
        for item in trash.iter()? {
            let (_, value) = item?;
            entries.push(decode_trash(value.value())?);
        }
        sort_trash(&mut entries);
        Ok(entries)
    }

    fn count(&self) -> Result<usize, AppError> {
        let read_txn = self.db.begin_read()?;
        let spells = read_txn.open_table(SPELLS)?;
        Ok(spells.len()? as usize)
    }
}
