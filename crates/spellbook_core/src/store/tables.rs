//! redb table definitions used by the table backend.

use redb::TableDefinition;

/// Live spell rows (`Spell`, bincode-encoded).
pub const SPELLS: TableDefinition<&str, &[u8]> = TableDefinition::new("spells");

/// Recency index ordered by reverse creation nanos, then id.
pub const SPELLS_BY_CREATED: TableDefinition<(u64, &str), ()> =
    TableDefinition::new("spells_by_created");

/// Trash rows (`(Spell, deleted_at)`, bincode-encoded).
pub const TRASH: TableDefinition<&str, &[u8]> = TableDefinition::new("trash");
