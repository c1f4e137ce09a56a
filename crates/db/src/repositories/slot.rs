use crate::models::DbSlot;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Inserts a batch of slots for one host in a single transaction, so a
/// failure part way through leaves no partial declaration behind.
pub async fn create_slots(
    pool: &Pool<Postgres>,
    host_id: Uuid,
    windows: &[(DateTime<Utc>, DateTime<Utc>)],
) -> Result<Vec<DbSlot>> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let mut created = Vec::with_capacity(windows.len());
    for (start_time, end_time) in windows {
        let slot = sqlx::query_as::<_, DbSlot>(
            r#"
            INSERT INTO slots (id, host_id, start_time, end_time, status, claimed_by, created_at)
            VALUES ($1, $2, $3, $4, 'free', NULL, $5)
            RETURNING id, host_id, start_time, end_time, status, claimed_by, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(host_id)
        .bind(start_time)
        .bind(end_time)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        created.push(slot);
    }

    tx.commit().await?;

    Ok(created)
}

pub async fn get_slot_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbSlot>> {
    let slot = sqlx::query_as::<_, DbSlot>(
        r#"
        SELECT id, host_id, start_time, end_time, status, claimed_by, created_at
        FROM slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

/// Free slots of a host whose window has not fully elapsed, ascending by
/// start. Expiry is evaluated at query time, never stored.
pub async fn list_future_free_slots(pool: &Pool<Postgres>, host_id: Uuid) -> Result<Vec<DbSlot>> {
    let slots = sqlx::query_as::<_, DbSlot>(
        r#"
        SELECT id, host_id, start_time, end_time, status, claimed_by, created_at
        FROM slots
        WHERE host_id = $1 AND status = 'free' AND end_time > NOW()
        ORDER BY start_time ASC
        "#,
    )
    .bind(host_id)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

/// Deletes a slot owned by `host_id`. Returns false when the slot does not
/// exist or belongs to someone else; the caller maps that to `NotFound`.
pub async fn delete_slot(pool: &Pool<Postgres>, id: Uuid, host_id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM slots
        WHERE id = $1 AND host_id = $2
        "#,
    )
    .bind(id)
    .bind(host_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn clear_slots(pool: &Pool<Postgres>, host_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM slots
        WHERE host_id = $1
        "#,
    )
    .bind(host_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Atomically claims a slot for a meeting.
///
/// The status guard makes this a compare-and-swap: of N concurrent claimers
/// exactly one sees an affected row, the rest get `None` and the caller maps
/// that to `SlotConflict`.
pub async fn claim_slot(
    pool: &Pool<Postgres>,
    slot_id: Uuid,
    meeting_id: Uuid,
) -> Result<Option<DbSlot>> {
    let slot = sqlx::query_as::<_, DbSlot>(
        r#"
        UPDATE slots
        SET status = 'claimed', claimed_by = $2
        WHERE id = $1 AND status = 'free'
        RETURNING id, host_id, start_time, end_time, status, claimed_by, created_at
        "#,
    )
    .bind(slot_id)
    .bind(meeting_id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

/// Claims the earliest free slot of `host_id` that covers `[start, end)`,
/// if any. Used at meeting acceptance to bind the agreed window to declared
/// availability; no covering slot is not an error.
pub async fn claim_covering_slot(
    pool: &Pool<Postgres>,
    host_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    meeting_id: Uuid,
) -> Result<Option<DbSlot>> {
    let slot = sqlx::query_as::<_, DbSlot>(
        r#"
        UPDATE slots
        SET status = 'claimed', claimed_by = $4
        WHERE id = (
            SELECT id FROM slots
            WHERE host_id = $1 AND status = 'free'
              AND start_time <= $2 AND end_time >= $3
            ORDER BY start_time ASC
            LIMIT 1
        )
        AND status = 'free'
        RETURNING id, host_id, start_time, end_time, status, claimed_by, created_at
        "#,
    )
    .bind(host_id)
    .bind(start_time)
    .bind(end_time)
    .bind(meeting_id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

/// Returns the slot claimed by `meeting_id` to the free set.
///
/// Idempotent by construction: a second release for the same meeting matches
/// zero rows and never produces a duplicate free slot.
pub async fn release_slot(pool: &Pool<Postgres>, meeting_id: Uuid) -> Result<Option<DbSlot>> {
    let slot = sqlx::query_as::<_, DbSlot>(
        r#"
        UPDATE slots
        SET status = 'free', claimed_by = NULL
        WHERE claimed_by = $1 AND status = 'claimed'
        RETURNING id, host_id, start_time, end_time, status, claimed_by, created_at
        "#,
    )
    .bind(meeting_id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}
