use chrono::{DateTime, Utc};
use mockall::mock;
use uuid::Uuid;

use crate::models::{DbMeeting, DbSlot};
use crate::repositories::meeting::RescheduleOutcome;

// Mock repositories for testing
mock! {
    pub SlotRepo {
        pub async fn create_slots(
            &self,
            host_id: Uuid,
            windows: Vec<(DateTime<Utc>, DateTime<Utc>)>,
        ) -> eyre::Result<Vec<DbSlot>>;

        pub async fn get_slot_by_id(&self, id: Uuid) -> eyre::Result<Option<DbSlot>>;

        pub async fn list_future_free_slots(&self, host_id: Uuid) -> eyre::Result<Vec<DbSlot>>;

        pub async fn delete_slot(&self, id: Uuid, host_id: Uuid) -> eyre::Result<bool>;

        pub async fn clear_slots(&self, host_id: Uuid) -> eyre::Result<u64>;

        pub async fn claim_covering_slot(
            &self,
            host_id: Uuid,
            start_time: DateTime<Utc>,
            end_time: DateTime<Utc>,
            meeting_id: Uuid,
        ) -> eyre::Result<Option<DbSlot>>;

        pub async fn release_slot(&self, meeting_id: Uuid) -> eyre::Result<Option<DbSlot>>;
    }
}

mock! {
    pub MeetingRepo {
        pub async fn create_meeting_checked(
            &self,
            requester_id: Uuid,
            host_id: Uuid,
            start_time: DateTime<Utc>,
            end_time: DateTime<Utc>,
            message: Option<&'static str>,
        ) -> eyre::Result<Option<DbMeeting>>;

        pub async fn get_meeting_by_id(&self, id: Uuid) -> eyre::Result<Option<DbMeeting>>;

        pub async fn accept_pending(&self, id: Uuid) -> eyre::Result<Option<DbMeeting>>;

        pub async fn accept_reschedule(
            &self,
            id: Uuid,
            requester_id: Uuid,
            host_id: Uuid,
            proposed_by: &'static str,
            proposed_start: DateTime<Utc>,
            proposed_end: DateTime<Utc>,
        ) -> eyre::Result<RescheduleOutcome>;

        pub async fn reject_pending(&self, id: Uuid) -> eyre::Result<Option<DbMeeting>>;

        pub async fn cancel_meeting(&self, id: Uuid) -> eyre::Result<Option<DbMeeting>>;

        pub async fn propose_reschedule(
            &self,
            id: Uuid,
            proposed_start: DateTime<Utc>,
            proposed_end: DateTime<Utc>,
            proposed_by: &'static str,
            proposal_message: Option<&'static str>,
        ) -> eyre::Result<Option<DbMeeting>>;

        pub async fn bind_slot(&self, id: Uuid, slot_id: Uuid) -> eyre::Result<()>;

        pub async fn unbind_slot(&self, id: Uuid) -> eyre::Result<()>;

        pub async fn attach_link(
            &self,
            id: Uuid,
            join_link: &'static str,
            external_event_id: Option<&'static str>,
        ) -> eyre::Result<bool>;

        pub async fn meetings_for_user(
            &self,
            user_id: Uuid,
            future_only: bool,
        ) -> eyre::Result<Vec<DbMeeting>>;

        pub async fn meetings_between(
            &self,
            user_a: Uuid,
            user_b: Uuid,
        ) -> eyre::Result<Vec<DbMeeting>>;
    }
}
