//! Trash HTTP handlers.

use crate::models::{Spell, TrashEntry};
use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{Path, State},
    Json,
};

/// List soft-deleted spells, most recently deleted first.
pub async fn list_trash(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrashEntry>>, HttpError> {
    Ok(Json(state.store.list_trash()?))
}

/// Move a trash entry back into the live set.
///
/// # Errors
/// Returns 404 when the id is not in the trash, 409 when a live spell
/// already uses it.
pub async fn restore_spell(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Spell>, HttpError> {
    let restored = state.store.restore(&id)?.ok_or(AppError::NotFound)?;
    tracing::debug!("Restored spell {} from trash", restored.id);
    Ok(Json(restored))
}
