use ulid::Ulid;

use crate::model::BookingStatus;

/// Expected domain outcomes plus infrastructure failures. Everything except
/// `Unavailable` is a normal rejection the caller renders to the user.
#[derive(Debug)]
pub enum ScheduleError {
    /// Date falls inside an active organization-wide blackout window.
    ClosureBlocked(Ulid),
    /// The requesting user already holds a live booking overlapping the window.
    UserConflict(Ulid),
    /// The requested room already holds a live booking overlapping the window.
    ResourceConflict(Ulid),
    /// Department hit its weekly approved-booking ceiling (carries the limit).
    QuotaExceeded(u32),
    /// Every active account conflicts with the window, or the pool is empty.
    /// The booking stays Pending.
    NoAccountAvailable,
    /// External occurrence id already imported (idempotent dedup).
    AlreadyExists(String),
    /// End not after start, or the window would cross midnight.
    InvalidInterval,
    /// Department has no configured quota record — a configuration error,
    /// never silently allowed or denied.
    UnknownDepartment(Ulid),
    NotFound(Ulid),
    /// Transition not legal from the booking's current status.
    InvalidTransition(BookingStatus),
    /// Reject/cancel called without the required audit reason.
    ReasonRequired,
    LimitExceeded(&'static str),
    /// Storage/transport failure from an external collaborator.
    Unavailable(String),
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::ClosureBlocked(id) => {
                write!(f, "date falls inside active closure {id}")
            }
            ScheduleError::UserConflict(id) => {
                write!(f, "user already has overlapping booking {id}")
            }
            ScheduleError::ResourceConflict(id) => {
                write!(f, "room already has overlapping booking {id}")
            }
            ScheduleError::QuotaExceeded(limit) => {
                write!(f, "department weekly limit {limit} reached")
            }
            ScheduleError::NoAccountAvailable => {
                write!(f, "no active account free for the requested window")
            }
            ScheduleError::AlreadyExists(ext) => {
                write!(f, "occurrence already imported: {ext}")
            }
            ScheduleError::InvalidInterval => {
                write!(f, "interval end must be after start within one day")
            }
            ScheduleError::UnknownDepartment(id) => {
                write!(f, "no quota configured for department {id}")
            }
            ScheduleError::NotFound(id) => write!(f, "not found: {id}"),
            ScheduleError::InvalidTransition(status) => {
                write!(f, "transition not allowed from {status:?}")
            }
            ScheduleError::ReasonRequired => {
                write!(f, "a decision reason is required for audit")
            }
            ScheduleError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            ScheduleError::Unavailable(e) => write!(f, "storage unavailable: {e}"),
        }
    }
}

impl std::error::Error for ScheduleError {}
