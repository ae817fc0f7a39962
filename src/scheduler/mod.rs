mod allocator;
mod closure;
mod conflict;
mod error;
mod quota;
mod recurrence;

pub use allocator::{allocate, rank_candidates};
pub use closure::active_closure_for;
pub use conflict::{account_conflict, find_conflict, has_overlap, room_conflict, user_conflict};
pub use error::ScheduleError;
pub use quota::{under_weekly_limit, week_bounds};
pub use recurrence::{
    expand, import_decision, occurrence_external_id, ImportDecision, RecurrencePattern,
};

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};
use ulid::Ulid;

use crate::config::ScheduleConfig;
use crate::limits::{MAX_EXTERNAL_ID_LEN, MAX_REASON_LEN};
use crate::model::{
    Booking, BookingRequest, BookingStatus, RecurringSeries, LIVE_STATUSES,
};
use crate::remote::ConferenceClient;
use crate::store::BookingStore;

/// The booking coordinator. Runs every request through the same pipeline —
/// closure guard, user/room conflict axes, weekly quota, account
/// allocation — and drives the Pending → Approved / Rejected / Cancelled
/// lifecycle.
pub struct Scheduler {
    store: Arc<dyn BookingStore>,
    remote: Arc<dyn ConferenceClient>,
    config: ScheduleConfig,
    /// Serializes every read-check-then-write section: submit's dedup and
    /// conflict commit, the whole approval step, lifecycle transitions, and
    /// the write-backs after a remote call. Two racing approvals for
    /// overlapping windows must not both pass the allocator's read, and a
    /// transition landing during a provider call must not be reverted by
    /// the caller's stale copy.
    commit_gate: Mutex<()>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn BookingStore>,
        remote: Arc<dyn ConferenceClient>,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            store,
            remote,
            config,
            commit_gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn BookingStore> {
        &self.store
    }

    /// Validate and persist a booking request as Pending.
    pub async fn submit(&self, request: BookingRequest) -> Result<Booking, ScheduleError> {
        let result = self.submit_inner(request).await;
        tally(crate::observability::SUBMISSIONS_TOTAL, &result, "pending");
        result
    }

    async fn submit_inner(&self, request: BookingRequest) -> Result<Booking, ScheduleError> {
        conflict::validate_slot(&request.slot)?;
        if let Some(ref ext) = request.external_occurrence_id
            && ext.len() > MAX_EXTERNAL_ID_LEN {
                return Err(ScheduleError::LimitExceeded("external id too long"));
            }

        // Blackout check overrides everything else.
        let closures = self
            .store
            .list_active_closures()
            .await
            .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;
        if let Some(closure) = active_closure_for(&closures, request.date) {
            return Err(ScheduleError::ClosureBlocked(closure.id));
        }

        // Dedup read, conflict read and insert must not interleave with
        // another commit.
        let _gate = self.commit_gate.lock().await;

        if request.external_occurrence_id.is_some() {
            let known = self
                .store
                .external_occurrence_ids()
                .await
                .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;
            if import_decision(&request, &known) == ImportDecision::Duplicate {
                metrics::counter!(crate::observability::IMPORT_DUPLICATES_TOTAL).increment(1);
                let ext = request.external_occurrence_id.unwrap_or_default();
                return Err(ScheduleError::AlreadyExists(ext));
            }
        }

        let existing = self
            .store
            .find_overlapping(request.date, request.slot, LIVE_STATUSES, None)
            .await
            .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;

        if let Some(hit) = user_conflict(&existing, request.user_id, &request.slot, None) {
            return Err(ScheduleError::UserConflict(hit.id));
        }
        if let Some(room_id) = request.room_id
            && let Some(hit) = room_conflict(&existing, room_id, &request.slot, None) {
                return Err(ScheduleError::ResourceConflict(hit.id));
            }

        let booking = Booking::pending(Ulid::new(), request);
        self.store
            .insert(booking.clone())
            .await
            .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;

        info!(booking = %booking.id, date = %booking.date, "booking submitted");
        Ok(booking)
    }

    /// Approve a pending booking: quota check, account allocation, commit.
    /// The whole step runs under the commit gate so concurrent approvals
    /// cannot double-book an account. If no account is free the booking
    /// stays Pending and `NoAccountAvailable` is returned.
    pub async fn approve(&self, id: Ulid) -> Result<Booking, ScheduleError> {
        let result = self.approve_inner(id).await;
        tally(crate::observability::APPROVALS_TOTAL, &result, "approved");
        result
    }

    async fn approve_inner(&self, id: Ulid) -> Result<Booking, ScheduleError> {
        let booking = {
            let _gate = self.commit_gate.lock().await;

            let mut booking = self.get_booking(id).await?;
            if booking.status != BookingStatus::Pending {
                return Err(ScheduleError::InvalidTransition(booking.status));
            }

            let department = self
                .store
                .department(booking.department_id)
                .await
                .map_err(|e| ScheduleError::Unavailable(e.to_string()))?
                .ok_or(ScheduleError::UnknownDepartment(booking.department_id))?;
            if !under_weekly_limit(self.store.as_ref(), &department, booking.date, None).await? {
                return Err(ScheduleError::QuotaExceeded(department.weekly_limit));
            }

            let candidates = self
                .store
                .list_active_accounts()
                .await
                .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;
            let account = allocate(self.store.as_ref(), candidates, booking.date, booking.slot)
                .await?
                .ok_or(ScheduleError::NoAccountAvailable)?;

            booking.account_id = Some(account.id);
            booking.status = BookingStatus::Approved;
            self.store
                .update(booking.clone())
                .await
                .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;
            booking
        };

        info!(
            booking = %booking.id,
            account = ?booking.account_id,
            "booking approved"
        );

        // Local approval is authoritative; the remote call is best effort.
        let remote_result = self.remote.create_meeting(&booking).await;
        if let Err(ref e) = remote_result {
            warn!(booking = %booking.id, error = %e, "remote meeting creation failed");
            metrics::counter!(crate::observability::REMOTE_SYNC_FAILURES_TOTAL).increment(1);
        }

        // The write-back re-reads under the gate. A cancellation that landed
        // during the provider call owns the record now; only a booking that
        // is still Approved takes the remote handle or the sync flag.
        let current = {
            let _gate = self.commit_gate.lock().await;
            let mut current = self.get_booking(id).await?;
            if current.status == BookingStatus::Approved {
                match &remote_result {
                    Ok(remote) => current.remote_id = Some(remote.remote_id.clone()),
                    Err(_) => current.remote_sync_pending = true,
                }
                self.store
                    .update(current.clone())
                    .await
                    .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;
                return Ok(current);
            }
            current
        };

        // Lost the record to a concurrent cancel: tear down the orphan
        // remote meeting instead of attaching it.
        if let Ok(remote) = remote_result
            && let Err(e) = self.remote.delete_meeting(&remote.remote_id).await {
                warn!(booking = %current.id, error = %e, "orphan remote meeting teardown failed");
                metrics::counter!(crate::observability::REMOTE_SYNC_FAILURES_TOTAL).increment(1);
                return self.flag_sync_pending(id).await;
            }
        Ok(current)
    }

    /// Reject a pending booking. Terminal; requires an audit reason.
    pub async fn reject(&self, id: Ulid, reason: &str) -> Result<Booking, ScheduleError> {
        validate_reason(reason)?;
        let booking = {
            let _gate = self.commit_gate.lock().await;
            let mut booking = self.get_booking(id).await?;
            if booking.status != BookingStatus::Pending {
                return Err(ScheduleError::InvalidTransition(booking.status));
            }

            booking.status = BookingStatus::Rejected;
            booking.account_id = None;
            booking.decision_reason = Some(reason.to_string());
            self.store
                .update(booking.clone())
                .await
                .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;
            booking
        };

        metrics::counter!(crate::observability::DECISIONS_TOTAL, "action" => "reject")
            .increment(1);
        info!(booking = %booking.id, "booking rejected");
        Ok(booking)
    }

    /// Cancel a pending or approved booking. Always permitted regardless of
    /// any in-flight remote call; requires an audit reason. The local
    /// transition commits first; remote teardown is best effort afterwards.
    pub async fn cancel(&self, id: Ulid, reason: &str) -> Result<Booking, ScheduleError> {
        validate_reason(reason)?;
        let booking = {
            let _gate = self.commit_gate.lock().await;
            let mut booking = self.get_booking(id).await?;
            if !booking.status.is_live() {
                return Err(ScheduleError::InvalidTransition(booking.status));
            }

            booking.status = BookingStatus::Cancelled;
            booking.account_id = None;
            booking.decision_reason = Some(reason.to_string());
            self.store
                .update(booking.clone())
                .await
                .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;
            booking
        };

        metrics::counter!(crate::observability::DECISIONS_TOTAL, "action" => "cancel")
            .increment(1);
        info!(booking = %booking.id, "booking cancelled");

        // Failure never blocks or reverts the cancellation.
        if let Some(ref remote_id) = booking.remote_id
            && let Err(e) = self.remote.delete_meeting(remote_id).await {
                warn!(booking = %booking.id, error = %e, "remote meeting deletion failed");
                metrics::counter!(crate::observability::REMOTE_SYNC_FAILURES_TOTAL).increment(1);
                return self.flag_sync_pending(id).await;
            }
        Ok(booking)
    }

    /// Expand a recurring series into discrete booking requests, each
    /// tagged with a stable per-occurrence external id.
    pub fn expand_series(&self, series: &RecurringSeries) -> Vec<BookingRequest> {
        expand(series, self.config.occurrence_cap)
    }

    /// Import one expanded occurrence. Idempotent: a draft whose external
    /// occurrence id is already stored yields `AlreadyExists` and is not
    /// re-inserted. The dedup read runs inside submit's commit section, so
    /// two concurrent imports of the same draft cannot both insert.
    pub async fn import_occurrence(
        &self,
        draft: BookingRequest,
    ) -> Result<Booking, ScheduleError> {
        self.submit(draft).await
    }

    /// Mark the booking for out-of-band remote reconciliation after a
    /// failed provider call.
    async fn flag_sync_pending(&self, id: Ulid) -> Result<Booking, ScheduleError> {
        let _gate = self.commit_gate.lock().await;
        let mut booking = self.get_booking(id).await?;
        booking.remote_sync_pending = true;
        self.store
            .update(booking.clone())
            .await
            .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;
        Ok(booking)
    }

    async fn get_booking(&self, id: Ulid) -> Result<Booking, ScheduleError> {
        self.store
            .get(id)
            .await
            .map_err(|e| ScheduleError::Unavailable(e.to_string()))?
            .ok_or(ScheduleError::NotFound(id))
    }
}

fn validate_reason(reason: &str) -> Result<(), ScheduleError> {
    if reason.trim().is_empty() {
        return Err(ScheduleError::ReasonRequired);
    }
    if reason.len() > MAX_REASON_LEN {
        return Err(ScheduleError::LimitExceeded("decision reason too long"));
    }
    Ok(())
}

fn tally(counter: &'static str, result: &Result<Booking, ScheduleError>, ok_label: &'static str) {
    let outcome = match result {
        Ok(_) => ok_label,
        Err(e) => crate::observability::outcome_label(e),
    };
    metrics::counter!(counter, "outcome" => outcome).increment(1);
}
