//! Client side of Spellbook: API access, observable view state, and the
//! orchestrator that keeps the two in step.

/// Async API trait and its reqwest implementation.
pub mod api;
/// API base URL resolution.
pub mod config;
pub mod error;
/// Per-operation in-flight state machine.
pub mod op_state;
/// Observable client state container.
pub mod store;
/// Load/save/delete orchestration against the API.
pub mod sync;

pub use api::{HttpSpellApi, SpellApi};
pub use config::{resolve_endpoint, ApiEndpoint};
pub use error::ClientError;
pub use op_state::{LoadingFlag, OpState};
pub use store::{ClientState, ClientStore, Selection, SortOrder, SubscriptionId};
pub use sync::{Notice, NoticeLevel, NoticeSink, SyncOrchestrator};
