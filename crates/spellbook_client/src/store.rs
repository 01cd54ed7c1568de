//! Observable client-side state container.
//!
//! [`ClientStore`] owns a [`ClientState`] that is only changed through named
//! operations. Every operation updates state synchronously and then notifies
//! each subscriber exactly once.

use crate::op_state::{LoadingFlag, LoadingFlags, OpState};
use spellbook_core::models::{Spell, SpellDraft, TrashEntry};
use std::cmp::Ordering;

/// What the editor is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Existing(Spell),
    /// Unsaved form contents; has no id yet.
    Draft(SpellDraft),
}

impl Selection {
    pub fn id(&self) -> Option<&str> {
        match self {
            Selection::Existing(spell) => Some(spell.id.as_str()),
            Selection::Draft(_) => None,
        }
    }

    /// Editable form contents for this selection.
    pub fn draft(&self) -> SpellDraft {
        match self {
            Selection::Existing(spell) => SpellDraft::from(spell),
            Selection::Draft(draft) => draft.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    /// Loaded pages in server order.
    pub spells: Vec<Spell>,
    pub selection: Option<Selection>,
    pub total: usize,
    /// Always `spells.len()`: the next page starts after the loaded records.
    pub offset: usize,
    pub loading: LoadingFlags,
    pub error: Option<String>,
    pub search_query: String,
    pub sort_order: SortOrder,
    pub trash: Vec<TrashEntry>,
}

/// Name comparison: case-folded first, original text as the tie-break.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn matches_query(spell: &Spell, needle: &str) -> bool {
    spell.name.to_lowercase().contains(needle)
        || spell.description.to_lowercase().contains(needle)
        || spell.element.as_str().to_lowercase().contains(needle)
}

impl ClientState {
    /// Loaded spells matching the search query, sorted by name.
    ///
    /// Leaves `spells` in its stored order.
    pub fn filtered_and_sorted(&self) -> Vec<Spell> {
        let needle = self.search_query.to_lowercase();
        let mut view: Vec<Spell> = self
            .spells
            .iter()
            .filter(|spell| needle.is_empty() || matches_query(spell, &needle))
            .cloned()
            .collect();
        match self.sort_order {
            SortOrder::Asc => view.sort_by(|a, b| compare_names(&a.name, &b.name)),
            SortOrder::Desc => view.sort_by(|a, b| compare_names(&b.name, &a.name)),
        }
        view
    }

    pub fn has_more(&self) -> bool {
        self.offset < self.total
    }
}

/// Handle returned by [`ClientStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn Fn(&ClientState) + Send + Sync>;

/// State container with a subscriber list.
///
/// Observers run synchronously inside the mutating call and receive the new
/// state by reference.
#[derive(Default)]
pub struct ClientStore {
    state: ClientState,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl std::fmt::Debug for ClientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientStore")
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&ClientState) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer; returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    fn notify(&self) {
        for (_, observer) in &self.observers {
            observer(&self.state);
        }
    }

    /// Replace the loaded list (page one / refresh).
    pub fn set_spells(&mut self, items: Vec<Spell>, total: usize) {
        self.state.offset = items.len();
        self.state.spells = items;
        self.state.total = total;
        self.notify();
    }

    /// Append a further page in server order.
    pub fn append_spells(&mut self, items: Vec<Spell>, total: usize) {
        self.state.spells.extend(items);
        self.state.offset = self.state.spells.len();
        self.state.total = total;
        self.notify();
    }

    pub fn set_selected_spell(&mut self, selection: Selection) {
        self.state.selection = Some(selection);
        self.notify();
    }

    pub fn clear_selected_spell(&mut self) {
        self.state.selection = None;
        self.notify();
    }

    /// Force a flag to `InFlight` (`true`) or `Idle` (`false`).
    pub fn set_loading(&mut self, flag: LoadingFlag, loading: bool) {
        let state = if loading {
            OpState::InFlight
        } else {
            OpState::Idle
        };
        self.state.loading.set(flag, state);
        self.notify();
    }

    /// Mark `flag` in flight. Returns `false` without notifying when it
    /// already is.
    pub fn begin(&mut self, flag: LoadingFlag) -> bool {
        match self.state.loading.get(flag).begin() {
            Some(next) => {
                self.state.loading.set(flag, next);
                self.notify();
                true
            }
            None => false,
        }
    }

    pub fn finish(&mut self, flag: LoadingFlag, succeeded: bool) {
        let next = self.state.loading.get(flag).finish(succeeded);
        self.state.loading.set(flag, next);
        self.notify();
    }

    /// Replace a loaded spell in place by id, or prepend it and bump `total`.
    ///
    /// An edited spell keeps its list position even if the server would now
    /// order it differently; a full reload realigns the two.
    pub fn update_spell_in_list(&mut self, spell: Spell) {
        match self.state.spells.iter_mut().find(|s| s.id == spell.id) {
            Some(existing) => *existing = spell,
            None => {
                self.state.spells.insert(0, spell);
                self.state.offset = self.state.spells.len();
                self.state.total += 1;
            }
        }
        self.notify();
    }

    pub fn remove_spell_from_list(&mut self, id: &str) {
        self.state.spells.retain(|spell| spell.id != id);
        self.state.offset = self.state.spells.len();
        self.state.total = self.state.total.saturating_sub(1);
        self.notify();
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.state.error = Some(message.into());
        self.notify();
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
        self.notify();
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.state.search_query = query.into();
        self.notify();
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.state.sort_order = order;
        self.notify();
    }

    pub fn set_trash(&mut self, entries: Vec<TrashEntry>) {
        self.state.trash = entries;
        self.notify();
    }

    pub fn filtered_and_sorted(&self) -> Vec<Spell> {
        self.state.filtered_and_sorted()
    }

    pub fn has_more(&self) -> bool {
        self.state.has_more()
    }
}
