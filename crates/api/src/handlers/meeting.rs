//! # Meeting Lifecycle Handlers
//!
//! Drives the reservation state machine between a requester and a host:
//! request, accept, reject, cancel, and reschedule proposal. Authorization
//! and transition legality are decided by the pure logic in
//! `mentormeet_core::models::meeting`; persistence applies each transition
//! with a status-guarded update, so when an accept races a cancel the first
//! writer wins and the loser comes back with `InvalidState`.
//!
//! Requests float freely against any future window — they do not have to hit
//! a declared slot. Declared availability comes into play at acceptance,
//! when the engine claims a free slot of the host covering the agreed window
//! (if one exists) so the listing no longer advertises it.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use mentormeet_core::{
    errors::MeetError,
    models::meeting::{
        CreateMeetingRequest, ListMeetingsResponse, MeetingResponse, MeetingStatus,
        RescheduleMeetingRequest,
    },
};
use mentormeet_db::repositories::meeting::RescheduleOutcome;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{auth::Principal, error_handling::AppError},
    provisioner::spawn_link_provisioning,
    ApiState,
};

/// Requests a meeting with `host_id` over the given window.
///
/// The overlap check against the pair's live meetings and the insert run
/// atomically in the repository; a conflicting window maps to
/// `SlotConflict`.
#[axum::debug_handler]
pub async fn request_meeting(
    State(state): State<Arc<ApiState>>,
    principal: Principal,
    Json(payload): Json<CreateMeetingRequest>,
) -> Result<Json<MeetingResponse>, AppError> {
    if payload.host_id == principal.user_id {
        return Err(AppError(MeetError::Forbidden(
            "cannot request a meeting with yourself".to_string(),
        )));
    }

    payload.window.validate(Utc::now())?;

    let created = mentormeet_db::repositories::meeting::create_meeting_checked(
        &state.db_pool,
        principal.user_id,
        payload.host_id,
        payload.window.start,
        payload.window.end,
        payload.message.as_deref(),
    )
    .await
    .map_err(MeetError::Database)?
    .ok_or_else(|| {
        MeetError::SlotConflict(
            "an existing meeting between these participants overlaps the requested window"
                .to_string(),
        )
    })?;

    Ok(Json(created.into_domain()?.into()))
}

/// Accepts a pending meeting (host) or a reschedule proposal (the
/// non-proposing party).
///
/// Accepting a proposal moves the agreed window, so the repository re-checks
/// the new window against the pair's other live meetings under the pair lock
/// and refuses the accept on overlap. The update is also pinned to the exact
/// proposal that was authorized; a proposal recorded in between maps to
/// `InvalidState`.
///
/// On success the engine claims a covering free slot of the host, binds it
/// to the meeting, and kicks off join-link provisioning in the background.
/// Provisioning failures never revert the acceptance.
#[axum::debug_handler]
pub async fn accept_meeting(
    State(state): State<Arc<ApiState>>,
    principal: Principal,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<MeetingResponse>, AppError> {
    let meeting = mentormeet_db::repositories::meeting::get_meeting_by_id(&state.db_pool, meeting_id)
        .await
        .map_err(MeetError::Database)?
        .ok_or_else(|| MeetError::NotFound(format!("Meeting with ID {} not found", meeting_id)))?
        .into_domain()?;

    let agreed = meeting.authorize_accept(principal.user_id)?;
    let was_reschedule = meeting.status == MeetingStatus::RescheduleRequested;

    let row = if was_reschedule {
        let proposer = meeting.proposed_by.ok_or_else(|| {
            MeetError::InvalidState("reschedule request carries no proposer".to_string())
        })?;

        match mentormeet_db::repositories::meeting::accept_reschedule(
            &state.db_pool,
            meeting_id,
            meeting.requester_id,
            meeting.host_id,
            proposer.as_str(),
            agreed.start,
            agreed.end,
        )
        .await
        .map_err(MeetError::Database)?
        {
            RescheduleOutcome::Accepted(row) => row,
            RescheduleOutcome::Conflict => {
                return Err(AppError(MeetError::SlotConflict(
                    "the proposed window overlaps another meeting between these participants"
                        .to_string(),
                )));
            }
            RescheduleOutcome::Superseded => {
                return Err(AppError(MeetError::InvalidState(
                    "the reschedule proposal changed before it could be accepted".to_string(),
                )));
            }
        }
    } else {
        mentormeet_db::repositories::meeting::accept_pending(&state.db_pool, meeting_id)
            .await
            .map_err(MeetError::Database)?
            .ok_or_else(|| {
                // Lost a race against a concurrent transition on this meeting.
                MeetError::InvalidState("meeting is no longer in an acceptable state".to_string())
            })?
    };

    let accepted = row.into_domain()?;

    // A reschedule moved the agreed window, so the previously claimed slot
    // (if any) no longer matches it and goes back to the free set.
    if was_reschedule {
        if let Some(_released) =
            mentormeet_db::repositories::slot::release_slot(&state.db_pool, meeting_id)
                .await
                .map_err(MeetError::Database)?
        {
            mentormeet_db::repositories::meeting::unbind_slot(&state.db_pool, meeting_id)
                .await
                .map_err(MeetError::Database)?;
        }
    }

    // Best-effort binding of the agreed window to declared availability.
    let claimed = mentormeet_db::repositories::slot::claim_covering_slot(
        &state.db_pool,
        accepted.host_id,
        agreed.start,
        agreed.end,
        meeting_id,
    )
    .await
    .map_err(MeetError::Database)?;

    if let Some(slot) = claimed {
        mentormeet_db::repositories::meeting::bind_slot(&state.db_pool, meeting_id, slot.id)
            .await
            .map_err(MeetError::Database)?;
    }

    spawn_link_provisioning(
        state.clone(),
        meeting_id,
        "Mentorship meeting".to_string(),
        agreed.start,
        agreed.end,
        vec![accepted.requester_id, accepted.host_id],
    );

    Ok(Json(accepted.into()))
}

/// Rejects a pending meeting request. Host only; terminal.
#[axum::debug_handler]
pub async fn reject_meeting(
    State(state): State<Arc<ApiState>>,
    principal: Principal,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<MeetingResponse>, AppError> {
    let meeting = mentormeet_db::repositories::meeting::get_meeting_by_id(&state.db_pool, meeting_id)
        .await
        .map_err(MeetError::Database)?
        .ok_or_else(|| MeetError::NotFound(format!("Meeting with ID {} not found", meeting_id)))?
        .into_domain()?;

    meeting.authorize_reject(principal.user_id)?;

    let row = mentormeet_db::repositories::meeting::reject_pending(&state.db_pool, meeting_id)
        .await
        .map_err(MeetError::Database)?
        .ok_or_else(|| {
            MeetError::InvalidState("meeting is no longer pending".to_string())
        })?;

    Ok(Json(row.into_domain()?.into()))
}

/// Cancels a meeting from any non-terminal state. Either participant.
///
/// Cancelling a `reschedule_requested` meeting is the only way to turn down
/// a proposal; there is no decline-and-revert. If the meeting had claimed a
/// declared slot, the slot returns to the host's free set; the release is a
/// compare-and-swap keyed on the claiming meeting, so replayed cancels can
/// never free the slot twice.
#[axum::debug_handler]
pub async fn cancel_meeting(
    State(state): State<Arc<ApiState>>,
    principal: Principal,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<MeetingResponse>, AppError> {
    let meeting = mentormeet_db::repositories::meeting::get_meeting_by_id(&state.db_pool, meeting_id)
        .await
        .map_err(MeetError::Database)?
        .ok_or_else(|| MeetError::NotFound(format!("Meeting with ID {} not found", meeting_id)))?
        .into_domain()?;

    meeting.authorize_cancel(principal.user_id)?;

    let row = mentormeet_db::repositories::meeting::cancel_meeting(&state.db_pool, meeting_id)
        .await
        .map_err(MeetError::Database)?
        .ok_or_else(|| {
            MeetError::InvalidState("meeting is already in a terminal state".to_string())
        })?;

    if let Some(_released) =
        mentormeet_db::repositories::slot::release_slot(&state.db_pool, meeting_id)
            .await
            .map_err(MeetError::Database)?
    {
        mentormeet_db::repositories::meeting::unbind_slot(&state.db_pool, meeting_id)
            .await
            .map_err(MeetError::Database)?;
    }

    Ok(Json(row.into_domain()?.into()))
}

/// Proposes a new window for a pending or accepted meeting.
///
/// Either participant may propose; the agreed window stays untouched until
/// the counterpart accepts the proposal.
#[axum::debug_handler]
pub async fn propose_reschedule(
    State(state): State<Arc<ApiState>>,
    principal: Principal,
    Path(meeting_id): Path<Uuid>,
    Json(payload): Json<RescheduleMeetingRequest>,
) -> Result<Json<MeetingResponse>, AppError> {
    payload.window.validate(Utc::now())?;

    let meeting = mentormeet_db::repositories::meeting::get_meeting_by_id(&state.db_pool, meeting_id)
        .await
        .map_err(MeetError::Database)?
        .ok_or_else(|| MeetError::NotFound(format!("Meeting with ID {} not found", meeting_id)))?
        .into_domain()?;

    let side = meeting.authorize_propose(principal.user_id)?;

    let row = mentormeet_db::repositories::meeting::propose_reschedule(
        &state.db_pool,
        meeting_id,
        payload.window.start,
        payload.window.end,
        side.as_str(),
        payload.message.as_deref(),
    )
    .await
    .map_err(MeetError::Database)?
    .ok_or_else(|| {
        MeetError::InvalidState("meeting can no longer be rescheduled".to_string())
    })?;

    Ok(Json(row.into_domain()?.into()))
}

/// Query parameters for listing the caller's meetings.
#[derive(Debug, Deserialize)]
pub struct ListMeetingsQuery {
    /// When true, only meetings whose window has not fully elapsed.
    pub future: Option<bool>,
}

/// Lists the caller's meetings on either side, ascending by start.
#[axum::debug_handler]
pub async fn list_my_meetings(
    State(state): State<Arc<ApiState>>,
    principal: Principal,
    Query(query): Query<ListMeetingsQuery>,
) -> Result<Json<ListMeetingsResponse>, AppError> {
    let rows = mentormeet_db::repositories::meeting::meetings_for_user(
        &state.db_pool,
        principal.user_id,
        query.future.unwrap_or(false),
    )
    .await
    .map_err(MeetError::Database)?;

    let meetings = rows
        .into_iter()
        .map(|row| row.into_domain().map(MeetingResponse::from))
        .collect::<eyre::Result<Vec<_>>>()?;

    Ok(Json(ListMeetingsResponse { meetings }))
}

/// Lists the caller's meeting history with one counterpart.
#[axum::debug_handler]
pub async fn list_meetings_with(
    State(state): State<Arc<ApiState>>,
    principal: Principal,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ListMeetingsResponse>, AppError> {
    let rows = mentormeet_db::repositories::meeting::meetings_between(
        &state.db_pool,
        principal.user_id,
        user_id,
    )
    .await
    .map_err(MeetError::Database)?;

    let meetings = rows
        .into_iter()
        .map(|row| row.into_domain().map(MeetingResponse::from))
        .collect::<eyre::Result<Vec<_>>>()?;

    Ok(Json(ListMeetingsResponse { meetings }))
}
