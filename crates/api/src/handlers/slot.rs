//! # Availability Slot Handlers
//!
//! Hosts (typically alumni) declare the time windows they are willing to
//! meet in; students browse them when picking a window to request. A host's
//! slots are deliberately allowed to overlap each other — multiple
//! simultaneous declarations are the host's own business, and the portal has
//! always permitted them. Expiry is a pure function of the current time, so
//! listings recompute it on every query instead of storing a flag.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use mentormeet_core::{
    errors::MeetError,
    models::slot::{ClearSlotsResponse, CreateSlotsRequest, CreateSlotsResponse, ListSlotsResponse, SlotResponse},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{auth::Principal, error_handling::AppError},
    ApiState,
};

/// Declares one or more availability slots for the calling host.
///
/// Each window is validated (`InvalidRange`, `PastWindow`) before anything
/// is written, and the repository inserts the batch in one transaction, so
/// neither a bad entry nor a database failure part way through leaves a
/// partial declaration behind.
#[axum::debug_handler]
pub async fn declare_slots(
    State(state): State<Arc<ApiState>>,
    principal: Principal,
    Json(payload): Json<CreateSlotsRequest>,
) -> Result<Json<CreateSlotsResponse>, AppError> {
    if payload.slots.is_empty() {
        return Err(AppError(MeetError::Validation(
            "at least one slot must be provided".to_string(),
        )));
    }

    let now = Utc::now();
    for window in &payload.slots {
        window.validate(now)?;
    }

    let windows: Vec<_> = payload
        .slots
        .iter()
        .map(|window| (window.start, window.end))
        .collect();

    let created = mentormeet_db::repositories::slot::create_slots(
        &state.db_pool,
        principal.user_id,
        &windows,
    )
    .await
    .map_err(MeetError::Database)?
    .into_iter()
    .map(|slot| SlotResponse {
        id: slot.id,
        start: slot.start_time,
        end: slot.end_time,
    })
    .collect();

    Ok(Json(CreateSlotsResponse { slots: created }))
}

/// Lists the calling host's own future free slots.
#[axum::debug_handler]
pub async fn list_my_slots(
    State(state): State<Arc<ApiState>>,
    principal: Principal,
) -> Result<Json<ListSlotsResponse>, AppError> {
    list_slots_of(&state, principal.user_id).await
}

/// Lists another user's future free slots, used when picking a window to
/// request a meeting in.
#[axum::debug_handler]
pub async fn list_user_slots(
    State(state): State<Arc<ApiState>>,
    _principal: Principal,
    Path(host_id): Path<Uuid>,
) -> Result<Json<ListSlotsResponse>, AppError> {
    list_slots_of(&state, host_id).await
}

async fn list_slots_of(
    state: &ApiState,
    host_id: Uuid,
) -> Result<Json<ListSlotsResponse>, AppError> {
    let slots = mentormeet_db::repositories::slot::list_future_free_slots(&state.db_pool, host_id)
        .await
        .map_err(MeetError::Database)?;

    Ok(Json(ListSlotsResponse {
        host_id,
        slots: slots
            .into_iter()
            .map(|slot| SlotResponse {
                id: slot.id,
                start: slot.start_time,
                end: slot.end_time,
            })
            .collect(),
    }))
}

/// Removes a single slot owned by the caller.
#[axum::debug_handler]
pub async fn remove_slot(
    State(state): State<Arc<ApiState>>,
    principal: Principal,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed =
        mentormeet_db::repositories::slot::delete_slot(&state.db_pool, slot_id, principal.user_id)
            .await
            .map_err(MeetError::Database)?;

    if !removed {
        return Err(AppError(MeetError::NotFound(format!(
            "Slot with ID {} not found",
            slot_id
        ))));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Removes every slot declared by the caller.
#[axum::debug_handler]
pub async fn clear_slots(
    State(state): State<Arc<ApiState>>,
    principal: Principal,
) -> Result<Json<ClearSlotsResponse>, AppError> {
    let removed = mentormeet_db::repositories::slot::clear_slots(&state.db_pool, principal.user_id)
        .await
        .map_err(MeetError::Database)?;

    Ok(Json(ClearSlotsResponse { removed }))
}
