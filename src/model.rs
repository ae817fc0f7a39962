use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Half-open time-of-day window `[start, end)` within a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        debug_assert!(start < end, "TimeSlot start must be before end");
        Self { start, end }
    }

    /// Half-open overlap: `[s1,e1)` and `[s2,e2)` collide iff `s1 < e2 && s2 < e1`.
    /// Back-to-back slots (one ends exactly when the other starts) do NOT overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration_min(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    /// Pending and Approved both occupy their time window for conflict purposes.
    pub fn is_live(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Approved)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Rejected | BookingStatus::Cancelled)
    }
}

/// Status sets passed to the conflict checker.
pub const LIVE_STATUSES: &[BookingStatus] = &[BookingStatus::Pending, BookingStatus::Approved];
pub const APPROVED_ONLY: &[BookingStatus] = &[BookingStatus::Approved];

/// The reservation unit. Owned by the scheduler's storage layer; never
/// deleted by this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub user_id: Ulid,
    pub department_id: Ulid,
    pub status: BookingStatus,
    /// Set only while status is live and the booking has been approved
    /// onto a host account.
    pub account_id: Option<Ulid>,
    /// Distinct room identity, when the deployment models one.
    pub room_id: Option<Ulid>,
    pub series_id: Option<Ulid>,
    pub external_occurrence_id: Option<String>,
    pub external_series_id: Option<String>,
    /// Audit text recorded on reject/cancel.
    pub decision_reason: Option<String>,
    /// Handle returned by the remote conferencing provider.
    pub remote_id: Option<String>,
    /// True when local approval succeeded but the remote provider call
    /// failed; reconciled out-of-band.
    pub remote_sync_pending: bool,
}

impl Booking {
    pub fn pending(id: Ulid, request: BookingRequest) -> Self {
        Self {
            id,
            date: request.date,
            slot: request.slot,
            user_id: request.user_id,
            department_id: request.department_id,
            status: BookingStatus::Pending,
            account_id: None,
            room_id: request.room_id,
            series_id: request.series_id,
            external_occurrence_id: request.external_occurrence_id,
            external_series_id: request.external_series_id,
            decision_reason: None,
            remote_id: None,
            remote_sync_pending: false,
        }
    }
}

/// A booking not yet persisted — the transient "requested" state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub user_id: Ulid,
    pub department_id: Ulid,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub room_id: Option<Ulid>,
    pub series_id: Option<Ulid>,
    pub external_occurrence_id: Option<String>,
    pub external_series_id: Option<String>,
}

/// Weekly quota owner. Read-mostly reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: Ulid,
    /// Max approved bookings per Monday–Sunday week. Always >= 1.
    pub weekly_limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Inactive,
}

/// Shared, finite hosting resource. `max_concurrent` is a ranking hint,
/// not a concurrency ceiling — the engine enforces no time-overlap per
/// account, not a counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Ulid,
    pub status: AccountStatus,
    pub max_concurrent: u32,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Organization-wide blackout window. Dates are inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Closure {
    pub id: Ulid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
}

impl Closure {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.active && self.start_date <= date && date <= self.end_date
    }
}

/// Recurring-series definition as delivered by the remote provider.
/// Consumed, not owned: the pattern arrives as an opaque label and may
/// name a type this engine does not know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringSeries {
    pub external_series_id: String,
    pub pattern: String,
    /// Step multiplier in the pattern's unit. Always >= 1.
    pub interval: u32,
    pub occurrences: u32,
    pub anchor: NaiveDateTime,
    pub duration_min: u32,
    pub user_id: Ulid,
    pub department_id: Ulid,
    pub room_id: Option<Ulid>,
    pub series_id: Option<Ulid>,
}
