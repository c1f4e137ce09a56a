use chrono::{Duration, Utc};
use mentormeet_api::middleware::error_handling::AppError;
use mentormeet_core::{
    errors::MeetError,
    models::meeting::{Meeting, MeetingStatus},
    models::time_range::TimeRange,
};
use mentormeet_db::repositories::meeting::RescheduleOutcome;
use uuid::Uuid;

use crate::test_utils::{
    db_meeting, db_meeting_with_proposal, db_slot, future_window, TestContext,
};

// Test wrappers that run the handlers' decision logic against the mock
// repositories, so the flows can be exercised without a database.

async fn test_request_meeting_wrapper(
    ctx: &mut TestContext,
    requester_id: Uuid,
    host_id: Uuid,
    window: TimeRange,
) -> Result<Meeting, AppError> {
    if host_id == requester_id {
        return Err(AppError(MeetError::Forbidden(
            "cannot request a meeting with yourself".to_string(),
        )));
    }

    window.validate(Utc::now())?;

    let created = ctx
        .meeting_repo
        .create_meeting_checked(requester_id, host_id, window.start, window.end, None)
        .await?
        .ok_or_else(|| {
            AppError(MeetError::SlotConflict(
                "an existing meeting between these participants overlaps the requested window"
                    .to_string(),
            ))
        })?;

    Ok(created.into_domain()?)
}

async fn test_accept_meeting_wrapper(
    ctx: &mut TestContext,
    meeting_id: Uuid,
    actor_id: Uuid,
) -> Result<Meeting, AppError> {
    let meeting = ctx
        .meeting_repo
        .get_meeting_by_id(meeting_id)
        .await?
        .ok_or_else(|| {
            AppError(MeetError::NotFound(format!(
                "Meeting with ID {} not found",
                meeting_id
            )))
        })?
        .into_domain()?;

    let agreed = meeting.authorize_accept(actor_id)?;
    let was_reschedule = meeting.status == MeetingStatus::RescheduleRequested;

    let row = if was_reschedule {
        let proposer = meeting.proposed_by.ok_or_else(|| {
            AppError(MeetError::InvalidState(
                "reschedule request carries no proposer".to_string(),
            ))
        })?;

        match ctx
            .meeting_repo
            .accept_reschedule(
                meeting_id,
                meeting.requester_id,
                meeting.host_id,
                proposer.as_str(),
                agreed.start,
                agreed.end,
            )
            .await?
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
        ctx.meeting_repo
            .accept_pending(meeting_id)
            .await?
            .ok_or_else(|| {
                AppError(MeetError::InvalidState(
                    "meeting is no longer in an acceptable state".to_string(),
                ))
            })?
    };

    let accepted = row.into_domain()?;

    if was_reschedule && ctx.slot_repo.release_slot(meeting_id).await?.is_some() {
        ctx.meeting_repo.unbind_slot(meeting_id).await?;
    }

    if let Some(slot) = ctx
        .slot_repo
        .claim_covering_slot(accepted.host_id, agreed.start, agreed.end, meeting_id)
        .await?
    {
        ctx.meeting_repo.bind_slot(meeting_id, slot.id).await?;
    }

    Ok(accepted)
}

async fn test_cancel_meeting_wrapper(
    ctx: &mut TestContext,
    meeting_id: Uuid,
    actor_id: Uuid,
) -> Result<Meeting, AppError> {
    let meeting = ctx
        .meeting_repo
        .get_meeting_by_id(meeting_id)
        .await?
        .ok_or_else(|| {
            AppError(MeetError::NotFound(format!(
                "Meeting with ID {} not found",
                meeting_id
            )))
        })?
        .into_domain()?;

    meeting.authorize_cancel(actor_id)?;

    let row = ctx
        .meeting_repo
        .cancel_meeting(meeting_id)
        .await?
        .ok_or_else(|| {
            AppError(MeetError::InvalidState(
                "meeting is already in a terminal state".to_string(),
            ))
        })?;

    if ctx.slot_repo.release_slot(meeting_id).await?.is_some() {
        ctx.meeting_repo.unbind_slot(meeting_id).await?;
    }

    Ok(row.into_domain()?)
}

#[tokio::test]
async fn test_request_meeting_happy_path() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let (start, end) = future_window();

    let created = db_meeting(requester, host, "pending", start, end);
    ctx.meeting_repo
        .expect_create_meeting_checked()
        .times(1)
        .returning(move |_, _, _, _, _| Ok(Some(created.clone())));

    let meeting =
        test_request_meeting_wrapper(&mut ctx, requester, host, TimeRange::new(start, end))
            .await
            .expect("request should succeed");

    assert_eq!(meeting.status, MeetingStatus::Pending);
    assert_eq!(meeting.requester_id, requester);
    assert_eq!(meeting.host_id, host);
}

#[tokio::test]
async fn test_request_meeting_self_booking_forbidden() {
    let mut ctx = TestContext::new();
    let user = Uuid::new_v4();
    let (start, end) = future_window();

    let result = test_request_meeting_wrapper(&mut ctx, user, user, TimeRange::new(start, end)).await;

    assert!(matches!(result, Err(AppError(MeetError::Forbidden(_)))));
}

#[tokio::test]
async fn test_request_meeting_past_window_rejected() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let start = Utc::now() - Duration::hours(2);
    let end = Utc::now() - Duration::hours(1);

    let result =
        test_request_meeting_wrapper(&mut ctx, requester, host, TimeRange::new(start, end)).await;

    assert!(matches!(result, Err(AppError(MeetError::PastWindow))));
}

#[tokio::test]
async fn test_request_meeting_overlap_maps_to_slot_conflict() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let (start, end) = future_window();

    // The repository reports an overlapping live meeting for this pair.
    ctx.meeting_repo
        .expect_create_meeting_checked()
        .times(1)
        .returning(|_, _, _, _, _| Ok(None));

    let result =
        test_request_meeting_wrapper(&mut ctx, requester, host, TimeRange::new(start, end)).await;

    assert!(matches!(result, Err(AppError(MeetError::SlotConflict(_)))));
}

#[tokio::test]
async fn test_accept_pending_claims_covering_slot() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let (start, end) = future_window();

    let pending = db_meeting(requester, host, "pending", start, end);
    let meeting_id = pending.id;
    let accepted = {
        let mut row = pending.clone();
        row.status = "accepted".to_string();
        row
    };

    ctx.meeting_repo
        .expect_get_meeting_by_id()
        .times(1)
        .returning(move |_| Ok(Some(pending.clone())));
    ctx.meeting_repo
        .expect_accept_pending()
        .times(1)
        .returning(move |_| Ok(Some(accepted.clone())));

    // A declared slot covers the agreed window and gets claimed and bound.
    let mut covering = db_slot(host, start, end);
    covering.status = "claimed".to_string();
    covering.claimed_by = Some(meeting_id);
    let slot_id = covering.id;
    ctx.slot_repo
        .expect_claim_covering_slot()
        .times(1)
        .returning(move |_, _, _, _| Ok(Some(covering.clone())));
    ctx.meeting_repo
        .expect_bind_slot()
        .withf(move |_, bound| *bound == slot_id)
        .times(1)
        .returning(|_, _| Ok(()));

    let meeting = test_accept_meeting_wrapper(&mut ctx, meeting_id, host)
        .await
        .expect("host accept should succeed");

    assert_eq!(meeting.status, MeetingStatus::Accepted);
}

#[tokio::test]
async fn test_accept_by_requester_is_forbidden() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let (start, end) = future_window();

    let pending = db_meeting(requester, host, "pending", start, end);
    let meeting_id = pending.id;
    ctx.meeting_repo
        .expect_get_meeting_by_id()
        .times(1)
        .returning(move |_| Ok(Some(pending.clone())));

    let result = test_accept_meeting_wrapper(&mut ctx, meeting_id, requester).await;

    assert!(matches!(result, Err(AppError(MeetError::Forbidden(_)))));
}

#[tokio::test]
async fn test_accept_losing_race_to_cancel_sees_invalid_state() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let (start, end) = future_window();

    let pending = db_meeting(requester, host, "pending", start, end);
    let meeting_id = pending.id;
    ctx.meeting_repo
        .expect_get_meeting_by_id()
        .times(1)
        .returning(move |_| Ok(Some(pending.clone())));
    // A concurrent cancel got there first: the guarded update matches no row.
    ctx.meeting_repo
        .expect_accept_pending()
        .times(1)
        .returning(|_| Ok(None));

    let result = test_accept_meeting_wrapper(&mut ctx, meeting_id, host).await;

    assert!(matches!(result, Err(AppError(MeetError::InvalidState(_)))));
}

#[tokio::test]
async fn test_accept_reschedule_swaps_in_proposed_window() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let (start, end) = future_window();

    let proposed = db_meeting_with_proposal(requester, host, start, end, "requester");
    let meeting_id = proposed.id;
    let proposed_start = proposed.proposed_start.unwrap();
    let proposed_end = proposed.proposed_end.unwrap();

    let accepted = {
        let mut row = db_meeting(requester, host, "accepted", proposed_start, proposed_end);
        row.id = meeting_id;
        row
    };

    ctx.meeting_repo
        .expect_get_meeting_by_id()
        .times(1)
        .returning(move |_| Ok(Some(proposed.clone())));
    ctx.meeting_repo
        .expect_accept_reschedule()
        .times(1)
        .returning(move |_, _, _, _, _, _| Ok(RescheduleOutcome::Accepted(accepted.clone())));

    // The window moved, so the old claimed slot is released and unbound.
    let mut old_slot = db_slot(host, start, end);
    old_slot.status = "claimed".to_string();
    old_slot.claimed_by = Some(meeting_id);
    ctx.slot_repo
        .expect_release_slot()
        .times(1)
        .returning(move |_| Ok(Some(old_slot.clone())));
    ctx.meeting_repo
        .expect_unbind_slot()
        .times(1)
        .returning(|_| Ok(()));
    // No declared slot covers the new window.
    ctx.slot_repo
        .expect_claim_covering_slot()
        .times(1)
        .returning(|_, _, _, _| Ok(None));

    let meeting = test_accept_meeting_wrapper(&mut ctx, meeting_id, host)
        .await
        .expect("counterpart accept should succeed");

    assert_eq!(meeting.status, MeetingStatus::Accepted);
    assert_eq!(meeting.start_time, proposed_start);
    assert_eq!(meeting.end_time, proposed_end);
    assert_eq!(meeting.proposed_start, None);
    assert_eq!(meeting.proposed_by, None);
}

#[tokio::test]
async fn test_accept_reschedule_overlapping_window_is_conflict() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let (start, end) = future_window();

    let proposed = db_meeting_with_proposal(requester, host, start, end, "requester");
    let meeting_id = proposed.id;
    ctx.meeting_repo
        .expect_get_meeting_by_id()
        .times(1)
        .returning(move |_| Ok(Some(proposed.clone())));
    // The pair holds another live meeting over the proposed window, so the
    // transactional accept rolls back.
    ctx.meeting_repo
        .expect_accept_reschedule()
        .times(1)
        .returning(|_, _, _, _, _, _| Ok(RescheduleOutcome::Conflict));
    // No slot bookkeeping happens for a refused accept.
    ctx.slot_repo.expect_release_slot().times(0);
    ctx.slot_repo.expect_claim_covering_slot().times(0);

    let result = test_accept_meeting_wrapper(&mut ctx, meeting_id, host).await;

    assert!(matches!(result, Err(AppError(MeetError::SlotConflict(_)))));
}

#[tokio::test]
async fn test_accept_reschedule_is_pinned_to_the_authorized_proposal() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let (start, end) = future_window();

    let proposed = db_meeting_with_proposal(requester, host, start, end, "requester");
    let meeting_id = proposed.id;
    let proposed_start = proposed.proposed_start.unwrap();
    let proposed_end = proposed.proposed_end.unwrap();
    ctx.meeting_repo
        .expect_get_meeting_by_id()
        .times(1)
        .returning(move |_| Ok(Some(proposed.clone())));
    // The update is keyed on the proposer and window that were authorized;
    // when a newer proposal replaced them, the accept does not land.
    ctx.meeting_repo
        .expect_accept_reschedule()
        .withf(move |_, _, _, by, proposal_start, proposal_end| {
            by == "requester" && *proposal_start == proposed_start && *proposal_end == proposed_end
        })
        .times(1)
        .returning(|_, _, _, _, _, _| Ok(RescheduleOutcome::Superseded));
    ctx.slot_repo.expect_release_slot().times(0);
    ctx.slot_repo.expect_claim_covering_slot().times(0);

    let result = test_accept_meeting_wrapper(&mut ctx, meeting_id, host).await;

    assert!(matches!(result, Err(AppError(MeetError::InvalidState(_)))));
}

#[tokio::test]
async fn test_proposer_accepting_own_proposal_is_forbidden() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let (start, end) = future_window();

    let proposed = db_meeting_with_proposal(requester, host, start, end, "requester");
    let meeting_id = proposed.id;
    ctx.meeting_repo
        .expect_get_meeting_by_id()
        .times(1)
        .returning(move |_| Ok(Some(proposed.clone())));

    let result = test_accept_meeting_wrapper(&mut ctx, meeting_id, requester).await;

    assert!(matches!(result, Err(AppError(MeetError::Forbidden(_)))));
}

#[tokio::test]
async fn test_cancel_releases_claimed_slot() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let (start, end) = future_window();

    let accepted = db_meeting(requester, host, "accepted", start, end);
    let meeting_id = accepted.id;
    let cancelled = {
        let mut row = accepted.clone();
        row.status = "cancelled".to_string();
        row
    };

    ctx.meeting_repo
        .expect_get_meeting_by_id()
        .times(1)
        .returning(move |_| Ok(Some(accepted.clone())));
    ctx.meeting_repo
        .expect_cancel_meeting()
        .times(1)
        .returning(move |_| Ok(Some(cancelled.clone())));

    let mut claimed = db_slot(host, start, end);
    claimed.status = "claimed".to_string();
    claimed.claimed_by = Some(meeting_id);
    ctx.slot_repo
        .expect_release_slot()
        .times(1)
        .returning(move |_| Ok(Some(claimed.clone())));
    ctx.meeting_repo
        .expect_unbind_slot()
        .times(1)
        .returning(|_| Ok(()));

    let meeting = test_cancel_meeting_wrapper(&mut ctx, meeting_id, requester)
        .await
        .expect("either participant may cancel");

    assert_eq!(meeting.status, MeetingStatus::Cancelled);
}

#[tokio::test]
async fn test_second_cancel_is_invalid_state_and_never_double_releases() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let (start, end) = future_window();

    let cancelled = db_meeting(requester, host, "cancelled", start, end);
    let meeting_id = cancelled.id;
    ctx.meeting_repo
        .expect_get_meeting_by_id()
        .times(1)
        .returning(move |_| Ok(Some(cancelled.clone())));
    // Authorization fails on the terminal status before any transition or
    // release is attempted.
    ctx.slot_repo.expect_release_slot().times(0);
    ctx.meeting_repo.expect_cancel_meeting().times(0);

    let result = test_cancel_meeting_wrapper(&mut ctx, meeting_id, host).await;

    assert!(matches!(result, Err(AppError(MeetError::InvalidState(_)))));
}

#[tokio::test]
async fn test_cancel_by_outsider_is_forbidden() {
    let mut ctx = TestContext::new();
    let requester = Uuid::new_v4();
    let host = Uuid::new_v4();
    let outsider = Uuid::new_v4();
    let (start, end) = future_window();

    let pending = db_meeting(requester, host, "pending", start, end);
    let meeting_id = pending.id;
    ctx.meeting_repo
        .expect_get_meeting_by_id()
        .times(1)
        .returning(move |_| Ok(Some(pending.clone())));

    let result = test_cancel_meeting_wrapper(&mut ctx, meeting_id, outsider).await;

    assert!(matches!(result, Err(AppError(MeetError::Forbidden(_)))));
}

#[tokio::test]
async fn test_meeting_not_found() {
    let mut ctx = TestContext::new();
    ctx.meeting_repo
        .expect_get_meeting_by_id()
        .times(1)
        .returning(|_| Ok(None));

    let result = test_accept_meeting_wrapper(&mut ctx, Uuid::new_v4(), Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError(MeetError::NotFound(_)))));
}
