//! Spell HTTP handlers.

use super::pagination::page_params;
use crate::models::validation::{validate_create, validate_update};
use crate::models::{ListQuery, Spell, SpellListResponse};
use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;

/// List live spells newest-first.
///
/// # Returns
/// `{ items, total, limit, offset }` with the effective (clamped) paging values.
///
/// # Errors
/// Returns 400 for non-numeric `limit`/`offset`, or a storage error.
pub async fn list_spells(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<SpellListResponse>, HttpError> {
    let Query(query) = query?;
    let (limit, offset) = page_params(&query)?;
    let page = state.store.list(limit, offset)?;
    Ok(Json(SpellListResponse {
        items: page.items,
        total: page.total,
        limit,
        offset,
    }))
}

/// Fetch a spell by id.
///
/// # Errors
/// Returns 404 when the spell is not in the live set.
pub async fn get_spell(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Spell>, HttpError> {
    state
        .store
        .get(&id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound.into())
}

/// Create a spell.
///
/// # Returns
/// `201 Created` with the stored record.
///
/// # Errors
/// Returns 400 with every rejected field when validation fails.
pub async fn create_spell(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Spell>), HttpError> {
    let Json(body) = body?;
    let draft = validate_create(&body)?;
    let spell = state.store.create(draft)?;
    tracing::debug!("Created spell {} ({})", spell.id, spell.name);
    Ok((StatusCode::CREATED, Json(spell)))
}

/// Merge the provided fields over an existing spell.
///
/// # Errors
/// Returns 400 for invalid fields (nothing is written) or 404 when missing.
pub async fn update_spell(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Spell>, HttpError> {
    let Json(body) = body?;
    let patch = validate_update(&body)?;
    state
        .store
        .update(&id, &patch)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound.into())
}

/// Move a spell to the trash.
///
/// # Returns
/// The record as it was before deletion.
///
/// # Errors
/// Returns 404 when the spell is not in the live set.
pub async fn delete_spell(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Spell>, HttpError> {
    let deleted = state.store.delete(&id)?.ok_or(AppError::NotFound)?;
    tracing::debug!("Moved spell {} to trash", deleted.id);
    Ok(Json(deleted))
}
