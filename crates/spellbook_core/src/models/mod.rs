//! Data models shared by the store, server, and client.

/// Spell, trash, and list payload types.
pub mod spell;
/// Request body validation.
pub mod validation;


pub use spell::{
    Element, ListQuery, Rarity, Spell, SpellDraft, SpellListResponse, SpellPage, SpellPatch,
    TrashEntry,
};
