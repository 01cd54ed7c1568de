//! Reconciles the [`ClientStore`] with the remote record store.
//!
//! Each logical operation is guarded by its own loading flag: a second call
//! while the first is in flight returns immediately without touching the API.
//! Different operations may overlap and their results apply in completion
//! order.

use crate::api::SpellApi;
use crate::error::ClientError;
use crate::op_state::LoadingFlag;
use crate::store::{ClientState, ClientStore, Selection};
use spellbook_core::models::validation::validate_draft;
use spellbook_core::models::{Spell, SpellDraft, SpellPatch};
use spellbook_core::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// One-shot notification for the user (toast, status line, stderr).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub type NoticeSink = Arc<dyn Fn(&Notice) + Send + Sync>;

fn log_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => tracing::info!("{}", notice.message),
        NoticeLevel::Error => tracing::warn!("{}", notice.message),
    }
}

fn lock_store(store: &Mutex<ClientStore>) -> MutexGuard<'_, ClientStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds a loading flag in flight; releases it on drop whatever the outcome.
struct Flight<'a> {
    store: &'a Mutex<ClientStore>,
    flag: LoadingFlag,
    succeeded: bool,
}

impl<'a> Flight<'a> {
    fn begin(store: &'a Mutex<ClientStore>, flag: LoadingFlag) -> Option<Self> {
        if !lock_store(store).begin(flag) {
            tracing::debug!("{:?} operation already in flight; skipping", flag);
            return None;
        }
        Some(Self {
            store,
            flag,
            succeeded: false,
        })
    }

    fn succeed(&mut self) {
        self.succeeded = true;
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        lock_store(self.store).finish(self.flag, self.succeeded);
    }
}

/// Drives [`SpellApi`] calls and folds their results into a shared
/// [`ClientStore`].
///
/// The store mutex is never held across an `.await`.
pub struct SyncOrchestrator<A> {
    api: A,
    store: Arc<Mutex<ClientStore>>,
    notices: NoticeSink,
    page_size: usize,
}

impl<A: SpellApi> SyncOrchestrator<A> {
    /// Notices go to `tracing` until [`SyncOrchestrator::with_notices`] is used.
    pub fn new(api: A, store: Arc<Mutex<ClientStore>>) -> Self {
        Self {
            api,
            store,
            notices: Arc::new(log_notice),
            page_size: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_notices(mut self, sink: NoticeSink) -> Self {
        self.notices = sink;
        self
    }

    /// Page size for list requests, clamped to what the server accepts.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_LIST_LIMIT);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> Arc<Mutex<ClientStore>> {
        self.store.clone()
    }

    /// Copy of the current client state.
    pub fn snapshot(&self) -> ClientState {
        lock_store(&self.store).state().clone()
    }

    fn emit(&self, notice: Notice) {
        (self.notices)(&notice);
    }

    fn fail(&self, action: &str, err: &ClientError) {
        lock_store(&self.store).set_error(err.to_string());
        self.emit(Notice::error(format!("{} failed: {}", action, err)));
    }

    /// Reload from offset 0, replacing the loaded list.
    ///
    /// Returns `Ok(false)` when a list load is already in flight.
    ///
    /// # Errors
    /// Returns the API error after recording it in the store.
    pub async fn refresh(&self) -> Result<bool, ClientError> {
        self.load_page(false).await
    }

    /// Load the page after the records already loaded and append it.
    ///
    /// # Errors
    /// Returns the API error after recording it in the store.
    pub async fn load_more(&self) -> Result<bool, ClientError> {
        self.load_page(true).await
    }

    async fn load_page(&self, append: bool) -> Result<bool, ClientError> {
        let Some(mut flight) = Flight::begin(&self.store, LoadingFlag::List) else {
            return Ok(false);
        };
        let offset = {
            let mut store = lock_store(&self.store);
            store.clear_error();
            if append {
                store.state().offset
            } else {
                0
            }
        };

        match self.api.list(self.page_size, offset).await {
            Ok(page) => {
                {
                    let mut store = lock_store(&self.store);
                    if append {
                        store.append_spells(page.items, page.total);
                    } else {
                        store.set_spells(page.items, page.total);
                    }
                }
                flight.succeed();
                Ok(true)
            }
            Err(err) => {
                self.fail("Loading spells", &err);
                Err(err)
            }
        }
    }

    /// Fetch one spell and select it.
    ///
    /// # Errors
    /// Returns the API error after recording it in the store.
    pub async fn open_spell(&self, id: &str) -> Result<Option<Spell>, ClientError> {
        let Some(mut flight) = Flight::begin(&self.store, LoadingFlag::Spell) else {
            return Ok(None);
        };
        match self.api.get(id).await {
            Ok(spell) => {
                lock_store(&self.store).set_selected_spell(Selection::Existing(spell.clone()));
                flight.succeed();
                Ok(Some(spell))
            }
            Err(err) => {
                self.fail("Loading spell", &err);
                Err(err)
            }
        }
    }

    /// Select an empty draft for a new spell.
    pub fn new_spell(&self) {
        lock_store(&self.store).set_selected_spell(Selection::Draft(SpellDraft::default()));
    }

    /// Save `draft` against the current selection.
    ///
    /// An existing selection is updated in place. Anything else creates a new
    /// spell, reloads page one so the list matches server order, and selects
    /// the created record.
    ///
    /// # Returns
    /// The saved spell, or `None` when a save is already in flight.
    ///
    /// # Errors
    /// Returns [`ClientError::Validation`] for a blank name (no request is
    /// made), or the API error. Neither changes the list or selection.
    pub async fn save(&self, mut draft: SpellDraft) -> Result<Option<Spell>, ClientError> {
        let Some(mut flight) = Flight::begin(&self.store, LoadingFlag::Save) else {
            return Ok(None);
        };

        draft.name = draft.name.trim().to_string();
        if let Err(invalid) = validate_draft(&draft) {
            let err = ClientError::Validation(invalid.to_string());
            self.fail("Saving spell", &err);
            return Err(err);
        }

        let target = lock_store(&self.store)
            .state()
            .selection
            .as_ref()
            .and_then(Selection::id)
            .map(str::to_string);

        let saved = match target {
            Some(id) => self.save_existing(&id, draft).await?,
            None => self.save_new(&draft).await?,
        };
        flight.succeed();
        Ok(Some(saved))
    }

    async fn save_existing(&self, id: &str, draft: SpellDraft) -> Result<Spell, ClientError> {
        let updated = match self.api.update(id, &SpellPatch::from(draft)).await {
            Ok(spell) => spell,
            Err(err) => {
                self.fail("Saving spell", &err);
                return Err(err);
            }
        };
        {
            let mut store = lock_store(&self.store);
            store.clear_error();
            store.update_spell_in_list(updated.clone());
            store.set_selected_spell(Selection::Existing(updated.clone()));
        }
        self.emit(Notice::info(format!("Saved {}", updated.name)));
        Ok(updated)
    }

    async fn save_new(&self, draft: &SpellDraft) -> Result<Spell, ClientError> {
        let created = match self.api.create(draft).await {
            Ok(spell) => spell,
            Err(err) => {
                self.fail("Creating spell", &err);
                return Err(err);
            }
        };
        self.emit(Notice::info(format!("Created {}", created.name)));

        // Page one is reloaded so the new record lands where the server puts it.
        match self.api.list(self.page_size, 0).await {
            Ok(page) => {
                let selected = page
                    .items
                    .iter()
                    .find(|spell| spell.id == created.id)
                    .cloned()
                    .unwrap_or_else(|| created.clone());
                let mut store = lock_store(&self.store);
                store.clear_error();
                store.set_spells(page.items, page.total);
                store.set_selected_spell(Selection::Existing(selected.clone()));
                Ok(selected)
            }
            Err(err) => {
                {
                    let mut store = lock_store(&self.store);
                    store.update_spell_in_list(created.clone());
                    store.set_selected_spell(Selection::Existing(created.clone()));
                }
                self.fail("Reloading spells", &err);
                Ok(created)
            }
        }
    }

    /// Move a spell to the trash once `confirm` agrees.
    ///
    /// # Returns
    /// `Ok(false)` when declined or when a delete is already in flight.
    ///
    /// # Errors
    /// Returns the API error after recording it in the store.
    pub async fn delete_spell<F>(&self, id: &str, confirm: F) -> Result<bool, ClientError>
    where
        F: FnOnce(&str) -> bool,
    {
        if lock_store(&self.store).state().loading.delete.is_in_flight() {
            return Ok(false);
        }
        if !confirm(id) {
            tracing::debug!("Delete of {} declined", id);
            return Ok(false);
        }
        let Some(mut flight) = Flight::begin(&self.store, LoadingFlag::Delete) else {
            return Ok(false);
        };

        match self.api.delete(id).await {
            Ok(deleted) => {
                {
                    let mut store = lock_store(&self.store);
                    store.remove_spell_from_list(id);
                    store.clear_selected_spell();
                }
                flight.succeed();
                self.emit(Notice::info(format!("Moved {} to trash", deleted.name)));
                Ok(true)
            }
            Err(err) => {
                self.fail("Deleting spell", &err);
                Err(err)
            }
        }
    }

    /// Load the trash listing into the store.
    ///
    /// # Errors
    /// Returns the API error after recording it in the store.
    pub async fn load_trash(&self) -> Result<bool, ClientError> {
        let Some(mut flight) = Flight::begin(&self.store, LoadingFlag::Trash) else {
            return Ok(false);
        };
        match self.api.list_trash().await {
            Ok(entries) => {
                lock_store(&self.store).set_trash(entries);
                flight.succeed();
                Ok(true)
            }
            Err(err) => {
                self.fail("Loading trash", &err);
                Err(err)
            }
        }
    }

    /// Restore a trashed spell, then reload page one so it reappears at its
    /// creation-time position.
    ///
    /// # Errors
    /// Returns the API error after recording it in the store. A failed reload
    /// after a successful restore is recorded but not returned.
    pub async fn restore_spell(&self, id: &str) -> Result<Option<Spell>, ClientError> {
        let Some(mut flight) = Flight::begin(&self.store, LoadingFlag::Trash) else {
            return Ok(None);
        };
        let restored = match self.api.restore(id).await {
            Ok(spell) => spell,
            Err(err) => {
                self.fail("Restoring spell", &err);
                return Err(err);
            }
        };
        {
            let mut store = lock_store(&self.store);
            let remaining = store
                .state()
                .trash
                .iter()
                .filter(|entry| entry.spell.id != id)
                .cloned()
                .collect();
            store.set_trash(remaining);
        }
        flight.succeed();
        drop(flight);
        self.emit(Notice::info(format!("Restored {}", restored.name)));

        if let Err(err) = self.refresh().await {
            tracing::debug!("Reload after restore failed: {}", err);
        }
        Ok(Some(restored))
    }
}
