//! # Link Provisioner
//!
//! The calendar/video integration is an external collaborator: once a
//! meeting is accepted it eventually supplies a join link and a calendar
//! event id. Provisioning is strictly best-effort and runs off the request
//! path; a meeting is fully `accepted` with empty link fields, and a link
//! that arrives after the meeting has gone terminal is dropped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ApiState;

/// Result of a successful provisioning call.
#[derive(Debug, Clone)]
pub struct ProvisionedLink {
    pub join_link: String,
    pub external_event_id: Option<String>,
}

/// Contract for the external calendar/meet integration.
///
/// Attendees are passed as portal user ids; the provisioning service owns
/// the mapping to calendar identities, the same way the auth gateway owns
/// credentials.
#[async_trait]
pub trait LinkProvisioner: Send + Sync {
    async fn provision(
        &self,
        meeting_id: Uuid,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        attendees: &[Uuid],
    ) -> Result<ProvisionedLink>;
}

/// Deterministic provisioner deriving join links from a configured base URL.
///
/// Stands in for the real calendar integration in deployments where that
/// service is absent, and keeps the accept path identical either way.
pub struct StaticLinkProvisioner {
    base_url: String,
}

impl StaticLinkProvisioner {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl LinkProvisioner for StaticLinkProvisioner {
    async fn provision(
        &self,
        meeting_id: Uuid,
        _title: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _attendees: &[Uuid],
    ) -> Result<ProvisionedLink> {
        Ok(ProvisionedLink {
            join_link: format!("{}/{}", self.base_url.trim_end_matches('/'), meeting_id),
            external_event_id: None,
        })
    }
}

/// Kicks off provisioning for an accepted meeting without blocking the
/// caller's response.
///
/// Each attempt is bounded by the configured timeout; failures retry with
/// linear backoff up to the configured budget and are only logged — they
/// never surface as a failure of the acceptance itself.
pub fn spawn_link_provisioning(
    state: Arc<ApiState>,
    meeting_id: Uuid,
    title: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    attendees: Vec<Uuid>,
) {
    tokio::spawn(async move {
        let attempt_timeout = Duration::from_secs(state.provisioner_timeout);

        for attempt in 0..=state.provisioner_retries {
            let call = state
                .provisioner
                .provision(meeting_id, &title, start, end, &attendees);

            match tokio::time::timeout(attempt_timeout, call).await {
                Ok(Ok(link)) => {
                    match mentormeet_db::repositories::meeting::attach_link(
                        &state.db_pool,
                        meeting_id,
                        &link.join_link,
                        link.external_event_id.as_deref(),
                    )
                    .await
                    {
                        Ok(true) => {
                            info!(%meeting_id, "join link attached");
                        }
                        Ok(false) => {
                            // Meeting went terminal while we were provisioning.
                            info!(%meeting_id, "dropping join link for terminal meeting");
                        }
                        Err(err) => {
                            warn!(%meeting_id, %err, "failed to record join link");
                        }
                    }
                    return;
                }
                Ok(Err(err)) => {
                    warn!(%meeting_id, attempt, %err, "link provisioning failed");
                }
                Err(_) => {
                    warn!(%meeting_id, attempt, "link provisioning timed out");
                }
            }

            if attempt < state.provisioner_retries {
                tokio::time::sleep(Duration::from_secs(2 * (attempt as u64 + 1))).await;
            }
        }

        warn!(%meeting_id, "link provisioning exhausted its retry budget; link fields left empty");
    });
}
