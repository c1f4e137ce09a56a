use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{MeetError, MeetResult};

use super::time_range::TimeRange;

/// Meeting lifecycle status.
///
/// ```text
/// pending ----> accepted ----> cancelled
///    |    \        |
///    |     \       v
///    |      -> reschedule_requested --> accepted | cancelled
///    v
/// rejected
/// ```
///
/// `rejected` and `cancelled` are terminal. A `reschedule_requested` meeting
/// can only be accepted (swapping in the proposed window) or cancelled
/// outright; there is no decline-and-revert transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Pending,
    Accepted,
    RescheduleRequested,
    Rejected,
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Pending => "pending",
            MeetingStatus::Accepted => "accepted",
            MeetingStatus::RescheduleRequested => "reschedule_requested",
            MeetingStatus::Rejected => "rejected",
            MeetingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(MeetingStatus::Pending),
            "accepted" => Some(MeetingStatus::Accepted),
            "reschedule_requested" => Some(MeetingStatus::RescheduleRequested),
            "rejected" => Some(MeetingStatus::Rejected),
            "cancelled" => Some(MeetingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MeetingStatus::Rejected | MeetingStatus::Cancelled)
    }

    /// The statuses that count as "live" for overlap checks and slot
    /// bookkeeping.
    pub fn live_statuses() -> &'static [&'static str] {
        &["pending", "accepted", "reschedule_requested"]
    }
}

/// Which side of the meeting a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantSide {
    Requester,
    Host,
}

impl ParticipantSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantSide::Requester => "requester",
            ParticipantSide::Host => "host",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "requester" => Some(ParticipantSide::Requester),
            "host" => Some(ParticipantSide::Host),
            _ => None,
        }
    }
}

/// A reservation between two principals.
///
/// `start_time`/`end_time` always hold the last mutually agreed window; a
/// pending reschedule proposal lives in the `proposed_*` fields until the
/// counterpart accepts it. `slot_id` links to the availability slot the
/// meeting claimed at acceptance, if one covered the window. The join link
/// and external event id are best-effort enrichment filled in asynchronously
/// after acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub host_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub message: Option<String>,
    pub status: MeetingStatus,
    pub proposed_start: Option<DateTime<Utc>>,
    pub proposed_end: Option<DateTime<Utc>>,
    pub proposed_by: Option<ParticipantSide>,
    pub proposal_message: Option<String>,
    pub slot_id: Option<Uuid>,
    pub join_link: Option<String>,
    pub external_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn side_of(&self, user_id: Uuid) -> Option<ParticipantSide> {
        if user_id == self.requester_id {
            Some(ParticipantSide::Requester)
        } else if user_id == self.host_id {
            Some(ParticipantSide::Host)
        } else {
            None
        }
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.side_of(user_id).is_some()
    }

    pub fn agreed_window(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    /// Authorizes an accept by `actor` and resolves the window that becomes
    /// the agreed one.
    ///
    /// From `pending`, only the host may accept and the window is unchanged.
    /// From `reschedule_requested`, only the party who did NOT propose may
    /// accept, and the proposed window becomes the agreed one.
    pub fn authorize_accept(&self, actor_id: Uuid) -> MeetResult<TimeRange> {
        let side = self
            .side_of(actor_id)
            .ok_or_else(|| MeetError::Forbidden("not a participant of this meeting".into()))?;

        match self.status {
            MeetingStatus::Pending => {
                if side != ParticipantSide::Host {
                    return Err(MeetError::Forbidden(
                        "only the host may accept a pending meeting".into(),
                    ));
                }
                Ok(self.agreed_window())
            }
            MeetingStatus::RescheduleRequested => {
                let proposer = self.proposed_by.ok_or_else(|| {
                    MeetError::InvalidState("reschedule request carries no proposer".into())
                })?;
                if side == proposer {
                    return Err(MeetError::Forbidden(
                        "the proposing party cannot accept its own proposal".into(),
                    ));
                }
                match (self.proposed_start, self.proposed_end) {
                    (Some(start), Some(end)) => Ok(TimeRange::new(start, end)),
                    _ => Err(MeetError::InvalidState(
                        "reschedule request carries no proposed window".into(),
                    )),
                }
            }
            other => Err(MeetError::InvalidState(format!(
                "cannot accept a meeting in status {}",
                other.as_str()
            ))),
        }
    }

    /// Authorizes a reject by `actor`: host only, `pending` only.
    pub fn authorize_reject(&self, actor_id: Uuid) -> MeetResult<()> {
        let side = self
            .side_of(actor_id)
            .ok_or_else(|| MeetError::Forbidden("not a participant of this meeting".into()))?;
        if side != ParticipantSide::Host {
            return Err(MeetError::Forbidden(
                "only the host may reject a meeting request".into(),
            ));
        }
        if self.status != MeetingStatus::Pending {
            return Err(MeetError::InvalidState(format!(
                "cannot reject a meeting in status {}",
                self.status.as_str()
            )));
        }
        Ok(())
    }

    /// Authorizes a cancel by `actor`: either participant, any non-terminal
    /// status.
    pub fn authorize_cancel(&self, actor_id: Uuid) -> MeetResult<()> {
        if !self.is_participant(actor_id) {
            return Err(MeetError::Forbidden(
                "not a participant of this meeting".into(),
            ));
        }
        if self.status.is_terminal() {
            return Err(MeetError::InvalidState(format!(
                "meeting is already {}",
                self.status.as_str()
            )));
        }
        Ok(())
    }

    /// Authorizes a reschedule proposal by `actor` and returns the proposing
    /// side. Allowed from `pending` and `accepted` for either participant.
    pub fn authorize_propose(&self, actor_id: Uuid) -> MeetResult<ParticipantSide> {
        let side = self
            .side_of(actor_id)
            .ok_or_else(|| MeetError::Forbidden("not a participant of this meeting".into()))?;
        match self.status {
            MeetingStatus::Pending | MeetingStatus::Accepted => Ok(side),
            other => Err(MeetError::InvalidState(format!(
                "cannot propose a reschedule from status {}",
                other.as_str()
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMeetingRequest {
    pub host_id: Uuid,
    #[serde(flatten)]
    pub window: TimeRange,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleMeetingRequest {
    #[serde(flatten)]
    pub window: TimeRange,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingResponse {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub host_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: MeetingStatus,
    pub message: Option<String>,
    pub proposed_start: Option<DateTime<Utc>>,
    pub proposed_end: Option<DateTime<Utc>>,
    pub proposed_by: Option<ParticipantSide>,
    pub proposal_message: Option<String>,
    pub join_link: Option<String>,
}

impl From<Meeting> for MeetingResponse {
    fn from(meeting: Meeting) -> Self {
        MeetingResponse {
            id: meeting.id,
            requester_id: meeting.requester_id,
            host_id: meeting.host_id,
            start: meeting.start_time,
            end: meeting.end_time,
            status: meeting.status,
            message: meeting.message,
            proposed_start: meeting.proposed_start,
            proposed_end: meeting.proposed_end,
            proposed_by: meeting.proposed_by,
            proposal_message: meeting.proposal_message,
            join_link: meeting.join_link,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMeetingsResponse {
    pub meetings: Vec<MeetingResponse>,
}
