use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

/// Creates the tables and indexes the scheduler needs.
///
/// Runs once at process start (or from the `db-migrate` binary) and is
/// idempotent; it replaces the ad hoc per-connection index repair the old
/// portal performed.
pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create slots table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS slots (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            host_id UUID NOT NULL,
            start_time TIMESTAMP WITH TIME ZONE NOT NULL,
            end_time TIMESTAMP WITH TIME ZONE NOT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'free',
            claimed_by UUID NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_slot_range CHECK (end_time > start_time),
            CONSTRAINT valid_slot_status CHECK (status IN ('free', 'claimed'))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create meetings table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meetings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            requester_id UUID NOT NULL,
            host_id UUID NOT NULL,
            start_time TIMESTAMP WITH TIME ZONE NOT NULL,
            end_time TIMESTAMP WITH TIME ZONE NOT NULL,
            message TEXT NULL,
            status VARCHAR(32) NOT NULL DEFAULT 'pending',
            proposed_start TIMESTAMP WITH TIME ZONE NULL,
            proposed_end TIMESTAMP WITH TIME ZONE NULL,
            proposed_by VARCHAR(16) NULL,
            proposal_message TEXT NULL,
            slot_id UUID NULL REFERENCES slots(id),
            join_link TEXT NULL,
            external_event_id TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_meeting_range CHECK (end_time > start_time),
            CONSTRAINT distinct_participants CHECK (requester_id <> host_id),
            CONSTRAINT valid_meeting_status CHECK (
                status IN ('pending', 'accepted', 'reschedule_requested', 'rejected', 'cancelled')
            ),
            CONSTRAINT proposal_fields_consistent CHECK (
                (status = 'reschedule_requested')
                = (proposed_start IS NOT NULL AND proposed_end IS NOT NULL AND proposed_by IS NOT NULL)
            )
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_slots_host_id ON slots(host_id)",
        "CREATE INDEX IF NOT EXISTS idx_slots_host_status_end ON slots(host_id, status, end_time)",
        "CREATE INDEX IF NOT EXISTS idx_slots_claimed_by ON slots(claimed_by)",
        "CREATE INDEX IF NOT EXISTS idx_meetings_requester_id ON meetings(requester_id)",
        "CREATE INDEX IF NOT EXISTS idx_meetings_host_id ON meetings(host_id)",
        "CREATE INDEX IF NOT EXISTS idx_meetings_pair ON meetings(requester_id, host_id, status)",
        "CREATE INDEX IF NOT EXISTS idx_meetings_start_time ON meetings(start_time)",
    ];
    for statement in indexes {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
