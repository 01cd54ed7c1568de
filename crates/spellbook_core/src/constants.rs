//! Shared constants used across Spellbook crates.

/// Default API port for the Spellbook server.
pub const DEFAULT_PORT: u16 = 38420;

/// Default maximum request body accepted by the API layer.
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Page size used when `limit` is omitted from a list request.
pub const DEFAULT_LIST_LIMIT: usize = 20;
/// Upper bound for a single list page.
pub const MAX_LIST_LIMIT: usize = 100;

/// Default base URL for CLI/API clients.
pub const DEFAULT_CLIENT_API_URL: &str = "http://127.0.0.1:38420";

/// File names used by the JSON file backend.
pub const SPELLS_FILE_NAME: &str = "spells.json";
/// Trash collection file for the JSON file backend.
pub const TRASH_FILE_NAME: &str = "trash.json";
/// File name for the redb database within the data directory.
pub const TABLE_DB_FILE_NAME: &str = "spellbook.redb";
