//! Spell records, trash entries, and list payloads.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Magical school of a spell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    #[default]
    Arcane,
    Fire,
    Frost,
    Storm,
    Nature,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Arcane,
        Element::Fire,
        Element::Frost,
        Element::Storm,
        Element::Nature,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Element::Arcane => "Arcane",
            Element::Fire => "Fire",
            Element::Frost => "Frost",
            Element::Storm => "Storm",
            Element::Nature => "Nature",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|element| element.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How hard a spell is to come by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Mythic,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [Rarity::Common, Rarity::Uncommon, Rarity::Rare, Rarity::Mythic];

    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Mythic => "Mythic",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|rarity| rarity.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A spell stored by the record store and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spell {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub element: Element,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub mana_cost: u32,
    #[serde(default)]
    pub cooldown_sec: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fully-resolved fields for a new spell (defaults already applied).
///
/// Also used by clients as the editable form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellDraft {
    pub name: String,
    #[serde(default)]
    pub element: Element,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub mana_cost: u32,
    #[serde(default)]
    pub cooldown_sec: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<Rarity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana_cost: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_sec: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
}

impl From<SpellDraft> for SpellPatch {
    fn from(draft: SpellDraft) -> Self {
        Self {
            name: Some(draft.name),
            element: Some(draft.element),
            rarity: Some(draft.rarity),
            mana_cost: Some(draft.mana_cost),
            cooldown_sec: Some(draft.cooldown_sec),
            description: Some(draft.description),
            ingredients: Some(draft.ingredients),
        }
    }
}

impl From<&Spell> for SpellDraft {
    fn from(spell: &Spell) -> Self {
        Self {
            name: spell.name.clone(),
            element: spell.element,
            rarity: spell.rarity,
            mana_cost: spell.mana_cost,
            cooldown_sec: spell.cooldown_sec,
            description: spell.description.clone(),
            ingredients: spell.ingredients.clone(),
        }
    }
}

/// Pick an `updatedAt` that is strictly after `previous`.
///
/// Clock readings can repeat (or step backwards) between two fast writes; in
/// that case the result is `previous` plus one millisecond.
pub fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

impl Spell {
    /// Create a new spell with a fresh id and matching timestamps.
    pub fn new(draft: SpellDraft) -> Self {
        Self::new_at(draft, Utc::now())
    }

    pub(crate) fn new_at(draft: SpellDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            element: draft.element,
            rarity: draft.rarity,
            mana_cost: draft.mana_cost,
            cooldown_sec: draft.cooldown_sec,
            description: draft.description,
            ingredients: draft.ingredients,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge `patch` over this record and bump `updated_at`.
    ///
    /// `id` and `created_at` are never touched.
    pub fn apply_patch(&mut self, patch: &SpellPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(element) = patch.element {
            self.element = element;
        }
        if let Some(rarity) = patch.rarity {
            self.rarity = rarity;
        }
        if let Some(mana_cost) = patch.mana_cost {
            self.mana_cost = mana_cost;
        }
        if let Some(cooldown_sec) = patch.cooldown_sec {
            self.cooldown_sec = cooldown_sec;
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(ingredients) = &patch.ingredients {
            self.ingredients = ingredients.clone();
        }
        self.updated_at = next_updated_at(self.updated_at, Utc::now());
    }
}

/// A soft-deleted spell waiting in the trash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashEntry {
    #[serde(flatten)]
    pub spell: Spell,
    pub deleted_at: DateTime<Utc>,
}

impl TrashEntry {
    pub fn new(spell: Spell) -> Self {
        Self {
            spell,
            deleted_at: Utc::now(),
        }
    }

    /// Drop the `deletedAt` stamp and hand back the original record.
    pub fn into_spell(self) -> Spell {
        self.spell
    }
}

/// One page of the live collection as produced by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellPage {
    pub items: Vec<Spell>,
    pub total: usize,
}

/// `GET /spells` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellListResponse {
    pub items: Vec<Spell>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Raw `GET /spells` query parameters.
///
/// Kept as strings so non-numeric values surface as a field message instead of
/// a generic extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Key ordering spells newest-first by creation time.
///
/// Pre-epoch timestamps are clamped so the subtraction cannot underflow.
pub fn reverse_created_key(created_at: DateTime<Utc>) -> u64 {
    let nanos = created_at.timestamp_nanos_opt().unwrap_or(i64::MAX).max(0) as u64;
    u64::MAX - nanos
}

/// Sort spells newest-first by creation time, ties broken by id ascending.
///
/// Matches the iteration order of the table backend's recency index.
pub fn sort_newest_first(spells: &mut [Spell]) {
    spells.sort_by(|a, b| {
        reverse_created_key(a.created_at)
            .cmp(&reverse_created_key(b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}
