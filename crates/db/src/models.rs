use chrono::{DateTime, Utc};
use mentormeet_core::models::{
    meeting::{Meeting, MeetingStatus, ParticipantSide},
    slot::{Slot, SlotStatus},
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSlot {
    pub id: Uuid,
    pub host_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub claimed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl DbSlot {
    /// Maps the row into the domain model. An unknown status string means a
    /// row written by something that is not this codebase; treat it as
    /// claimed so it never re-enters the free set silently.
    pub fn into_domain(self) -> Slot {
        Slot {
            id: self.id,
            host_id: self.host_id,
            start_time: self.start_time,
            end_time: self.end_time,
            status: SlotStatus::parse(&self.status).unwrap_or(SlotStatus::Claimed),
            claimed_by: self.claimed_by,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbMeeting {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub host_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub message: Option<String>,
    pub status: String,
    pub proposed_start: Option<DateTime<Utc>>,
    pub proposed_end: Option<DateTime<Utc>>,
    pub proposed_by: Option<String>,
    pub proposal_message: Option<String>,
    pub slot_id: Option<Uuid>,
    pub join_link: Option<String>,
    pub external_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbMeeting {
    pub fn into_domain(self) -> eyre::Result<Meeting> {
        let status = MeetingStatus::parse(&self.status)
            .ok_or_else(|| eyre::eyre!("unknown meeting status in database: {}", self.status))?;
        let proposed_by = match self.proposed_by.as_deref() {
            Some(side) => Some(
                ParticipantSide::parse(side)
                    .ok_or_else(|| eyre::eyre!("unknown proposer side in database: {side}"))?,
            ),
            None => None,
        };

        Ok(Meeting {
            id: self.id,
            requester_id: self.requester_id,
            host_id: self.host_id,
            start_time: self.start_time,
            end_time: self.end_time,
            message: self.message,
            status,
            proposed_start: self.proposed_start,
            proposed_end: self.proposed_end,
            proposed_by,
            proposal_message: self.proposal_message,
            slot_id: self.slot_id,
            join_link: self.join_link,
            external_event_id: self.external_event_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
