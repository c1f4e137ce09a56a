use crate::models::DbMeeting;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const MEETING_COLUMNS: &str = "id, requester_id, host_id, start_time, end_time, message, status, \
     proposed_start, proposed_end, proposed_by, proposal_message, slot_id, \
     join_link, external_event_id, created_at, updated_at";

/// Advisory lock key for a participant pair, independent of which side is
/// the requester. Collisions only cost spurious serialization, never
/// correctness.
fn pair_lock_key(a: Uuid, b: Uuid) -> i64 {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let f = first.as_u128();
    let s = second.as_u128();
    let folded = ((f ^ (f >> 64)) as u64) ^ ((s ^ (s >> 64)) as u64).rotate_left(31);
    folded as i64
}

/// Inserts a new pending meeting unless the pair already has a live meeting
/// overlapping `[start, end)`.
///
/// The overlap check and insert run in one transaction under an advisory
/// xact lock on the pair key, so two racing overlapping requests for the
/// same pair serialize and the second observes the first. Returns `None`
/// when the window conflicts; unrelated pairs never contend.
pub async fn create_meeting_checked(
    pool: &Pool<Postgres>,
    requester_id: Uuid,
    host_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    message: Option<&str>,
) -> Result<Option<DbMeeting>> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(pair_lock_key(requester_id, host_id))
        .execute(&mut *tx)
        .await?;

    let conflict = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM meetings
            WHERE ((requester_id = $1 AND host_id = $2) OR (requester_id = $2 AND host_id = $1))
              AND status IN ('pending', 'accepted', 'reschedule_requested')
              AND start_time < $4 AND end_time > $3
        )
        "#,
    )
    .bind(requester_id)
    .bind(host_id)
    .bind(start_time)
    .bind(end_time)
    .fetch_one(&mut *tx)
    .await?;

    if conflict {
        tx.rollback().await?;
        return Ok(None);
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    let meeting = sqlx::query_as::<_, DbMeeting>(&format!(
        r#"
        INSERT INTO meetings (id, requester_id, host_id, start_time, end_time, message, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $7)
        RETURNING {MEETING_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(requester_id)
    .bind(host_id)
    .bind(start_time)
    .bind(end_time)
    .bind(message)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(meeting))
}

pub async fn get_meeting_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbMeeting>> {
    let meeting = sqlx::query_as::<_, DbMeeting>(&format!(
        r#"
        SELECT {MEETING_COLUMNS}
        FROM meetings
        WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(meeting)
}

/// `pending -> accepted`. The status guard makes concurrent transitions on
/// the same meeting resolve to a single winner; losers get `None`.
pub async fn accept_pending(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbMeeting>> {
    let meeting = sqlx::query_as::<_, DbMeeting>(&format!(
        r#"
        UPDATE meetings
        SET status = 'accepted', updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING {MEETING_COLUMNS}
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(meeting)
}

/// Outcome of accepting a reschedule proposal.
#[derive(Debug, Clone)]
pub enum RescheduleOutcome {
    /// The proposed window is now the agreed one.
    Accepted(DbMeeting),
    /// The proposed window overlaps another live meeting of the pair.
    Conflict,
    /// The proposal the caller authorized no longer exists; a concurrent
    /// transition replaced or cleared it.
    Superseded,
}

/// `reschedule_requested -> accepted`: the proposed window becomes the
/// agreed one and the proposal fields are cleared.
///
/// The update is guarded on the exact proposal the caller authorized
/// (`proposed_by` and the proposed window), so an accept can never land
/// against a proposal recorded after the authorization read. The whole
/// transition runs in a transaction under the pair advisory lock, and the
/// new window is re-checked against the pair's other live meetings before
/// committing; an overlap rolls the accept back.
pub async fn accept_reschedule(
    pool: &Pool<Postgres>,
    id: Uuid,
    requester_id: Uuid,
    host_id: Uuid,
    proposed_by: &str,
    proposed_start: DateTime<Utc>,
    proposed_end: DateTime<Utc>,
) -> Result<RescheduleOutcome> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(pair_lock_key(requester_id, host_id))
        .execute(&mut *tx)
        .await?;

    let meeting = sqlx::query_as::<_, DbMeeting>(&format!(
        r#"
        UPDATE meetings
        SET status = 'accepted',
            start_time = proposed_start,
            end_time = proposed_end,
            proposed_start = NULL,
            proposed_end = NULL,
            proposed_by = NULL,
            proposal_message = NULL,
            updated_at = NOW()
        WHERE id = $1 AND status = 'reschedule_requested'
          AND proposed_by = $2 AND proposed_start = $3 AND proposed_end = $4
        RETURNING {MEETING_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(proposed_by)
    .bind(proposed_start)
    .bind(proposed_end)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(meeting) = meeting else {
        tx.rollback().await?;
        return Ok(RescheduleOutcome::Superseded);
    };

    let conflict = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM meetings
            WHERE ((requester_id = $1 AND host_id = $2) OR (requester_id = $2 AND host_id = $1))
              AND id <> $3
              AND status IN ('pending', 'accepted', 'reschedule_requested')
              AND start_time < $5 AND end_time > $4
        )
        "#,
    )
    .bind(requester_id)
    .bind(host_id)
    .bind(id)
    .bind(meeting.start_time)
    .bind(meeting.end_time)
    .fetch_one(&mut *tx)
    .await?;

    if conflict {
        tx.rollback().await?;
        return Ok(RescheduleOutcome::Conflict);
    }

    tx.commit().await?;

    Ok(RescheduleOutcome::Accepted(meeting))
}

/// `pending -> rejected`.
pub async fn reject_pending(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbMeeting>> {
    let meeting = sqlx::query_as::<_, DbMeeting>(&format!(
        r#"
        UPDATE meetings
        SET status = 'rejected', updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING {MEETING_COLUMNS}
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(meeting)
}

/// Any live status `-> cancelled`. A pending proposal is cleared so the
/// proposal-fields invariant holds in the terminal state too.
pub async fn cancel_meeting(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbMeeting>> {
    let meeting = sqlx::query_as::<_, DbMeeting>(&format!(
        r#"
        UPDATE meetings
        SET status = 'cancelled',
            proposed_start = NULL,
            proposed_end = NULL,
            proposed_by = NULL,
            proposal_message = NULL,
            updated_at = NOW()
        WHERE id = $1 AND status IN ('pending', 'accepted', 'reschedule_requested')
        RETURNING {MEETING_COLUMNS}
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(meeting)
}

/// `pending|accepted -> reschedule_requested`, recording the proposed window
/// and which side proposed it. The agreed window is left untouched.
pub async fn propose_reschedule(
    pool: &Pool<Postgres>,
    id: Uuid,
    proposed_start: DateTime<Utc>,
    proposed_end: DateTime<Utc>,
    proposed_by: &str,
    proposal_message: Option<&str>,
) -> Result<Option<DbMeeting>> {
    let meeting = sqlx::query_as::<_, DbMeeting>(&format!(
        r#"
        UPDATE meetings
        SET status = 'reschedule_requested',
            proposed_start = $2,
            proposed_end = $3,
            proposed_by = $4,
            proposal_message = $5,
            updated_at = NOW()
        WHERE id = $1 AND status IN ('pending', 'accepted')
        RETURNING {MEETING_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(proposed_start)
    .bind(proposed_end)
    .bind(proposed_by)
    .bind(proposal_message)
    .fetch_optional(pool)
    .await?;

    Ok(meeting)
}

/// Records the availability slot a meeting claimed at acceptance.
pub async fn bind_slot(pool: &Pool<Postgres>, id: Uuid, slot_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE meetings
        SET slot_id = $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(slot_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Clears the slot binding, used when cancellation releases the slot.
pub async fn unbind_slot(pool: &Pool<Postgres>, id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE meetings
        SET slot_id = NULL, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Attaches the provisioned join link. Guarded to live statuses so a link
/// that arrives after the meeting went terminal is dropped; returns whether
/// the link was recorded.
pub async fn attach_link(
    pool: &Pool<Postgres>,
    id: Uuid,
    join_link: &str,
    external_event_id: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE meetings
        SET join_link = $2, external_event_id = $3, updated_at = NOW()
        WHERE id = $1 AND status IN ('pending', 'accepted', 'reschedule_requested')
        "#,
    )
    .bind(id)
    .bind(join_link)
    .bind(external_event_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Meetings where `user_id` is either participant, ascending by start.
/// `future_only` is evaluated against NOW() at query time.
pub async fn meetings_for_user(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    future_only: bool,
) -> Result<Vec<DbMeeting>> {
    let meetings = sqlx::query_as::<_, DbMeeting>(&format!(
        r#"
        SELECT {MEETING_COLUMNS}
        FROM meetings
        WHERE (requester_id = $1 OR host_id = $1)
          AND ($2 = FALSE OR end_time > NOW())
        ORDER BY start_time ASC
        "#,
    ))
    .bind(user_id)
    .bind(future_only)
    .fetch_all(pool)
    .await?;

    Ok(meetings)
}

/// Meetings between two participants in either orientation, ascending by
/// start. Backs both the history view and the overlap check.
pub async fn meetings_between(
    pool: &Pool<Postgres>,
    user_a: Uuid,
    user_b: Uuid,
) -> Result<Vec<DbMeeting>> {
    let meetings = sqlx::query_as::<_, DbMeeting>(&format!(
        r#"
        SELECT {MEETING_COLUMNS}
        FROM meetings
        WHERE (requester_id = $1 AND host_id = $2) OR (requester_id = $2 AND host_id = $1)
        ORDER BY start_time ASC
        "#,
    ))
    .bind(user_a)
    .bind(user_b)
    .fetch_all(pool)
    .await?;

    Ok(meetings)
}
