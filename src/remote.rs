use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::model::Booking;

/// Failure talking to the conferencing provider. Never rolls back local
/// state: an approved booking with a failed remote call is flagged
/// `remote_sync_pending` and reconciled out-of-band.
#[derive(Debug)]
pub struct RemoteError(pub String);

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "remote provider error: {}", self.0)
    }
}

impl std::error::Error for RemoteError {}

/// The only fields this core reads from a provider response; everything
/// else the provider returns is opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMeeting {
    pub remote_id: String,
    pub start: NaiveDateTime,
    pub duration_min: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOccurrence {
    pub external_occurrence_id: String,
    pub external_series_id: String,
    pub start: NaiveDateTime,
    pub duration_min: u32,
}

/// Outbound client for the third-party video-conferencing provider.
/// Called strictly after local state transitions; idempotent-retryable
/// on the collaborator's side. No timeouts here — those belong to the
/// HTTP implementation.
#[async_trait]
pub trait ConferenceClient: Send + Sync {
    async fn create_meeting(&self, booking: &Booking) -> Result<RemoteMeeting, RemoteError>;

    async fn update_meeting(&self, booking: &Booking) -> Result<RemoteMeeting, RemoteError>;

    async fn delete_meeting(&self, remote_id: &str) -> Result<(), RemoteError>;

    async fn fetch_meeting(&self, remote_id: &str) -> Result<RemoteMeeting, RemoteError>;

    async fn list_occurrences(
        &self,
        external_series_id: &str,
    ) -> Result<Vec<RemoteOccurrence>, RemoteError>;
}

/// No-op provider for deployments without an outbound integration.
pub struct NullConference;

#[async_trait]
impl ConferenceClient for NullConference {
    async fn create_meeting(&self, booking: &Booking) -> Result<RemoteMeeting, RemoteError> {
        Ok(RemoteMeeting {
            remote_id: format!("local-{}", booking.id),
            start: booking.date.and_time(booking.slot.start),
            duration_min: booking.slot.duration_min() as u32,
        })
    }

    async fn update_meeting(&self, booking: &Booking) -> Result<RemoteMeeting, RemoteError> {
        self.create_meeting(booking).await
    }

    async fn delete_meeting(&self, _remote_id: &str) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn fetch_meeting(&self, remote_id: &str) -> Result<RemoteMeeting, RemoteError> {
        Err(RemoteError(format!("no remote provider for {remote_id}")))
    }

    async fn list_occurrences(
        &self,
        _external_series_id: &str,
    ) -> Result<Vec<RemoteOccurrence>, RemoteError> {
        Ok(Vec::new())
    }
}
