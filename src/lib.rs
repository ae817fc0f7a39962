//! Meeting scheduling and resource allocation engine.
//!
//! Books time-boxed video-conference meetings against a shared pool of
//! constrained resources — host accounts, department weekly quotas and
//! organization-wide blackout windows — and guarantees that no two approved
//! meetings collide on a resource they exclusively need.

pub mod config;
pub mod limits;
pub mod model;
pub mod observability;
pub mod remote;
pub mod scheduler;
pub mod store;

pub use config::ScheduleConfig;
pub use model::{
    Account, AccountStatus, Booking, BookingRequest, BookingStatus, Closure, Department,
    RecurringSeries, TimeSlot, APPROVED_ONLY, LIVE_STATUSES,
};
pub use remote::{ConferenceClient, NullConference, RemoteError, RemoteMeeting, RemoteOccurrence};
pub use scheduler::{ScheduleError, Scheduler};
pub use store::{BookingStore, MemoryStore, StoreError};
