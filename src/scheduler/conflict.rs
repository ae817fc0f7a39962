use ulid::Ulid;

use crate::model::{Booking, BookingStatus, TimeSlot};

use super::ScheduleError;

/// Interval sanity check at the pipeline entrance. `NaiveTime` cannot
/// represent a next-day instant, so a window that would cross midnight
/// arrives here as `end <= start`.
pub(crate) fn validate_slot(slot: &TimeSlot) -> Result<(), ScheduleError> {
    if slot.end <= slot.start {
        return Err(ScheduleError::InvalidInterval);
    }
    Ok(())
}

/// Core overlap scan. `candidates` must already be same-date bookings.
/// Returns the first booking whose slot overlaps `slot`, whose status is in
/// `statuses`, and which is not the excluded id.
pub fn find_conflict<'a>(
    candidates: &'a [Booking],
    slot: &TimeSlot,
    statuses: &[BookingStatus],
    exclude: Option<Ulid>,
) -> Option<&'a Booking> {
    candidates.iter().find(|b| {
        statuses.contains(&b.status)
            && exclude != Some(b.id)
            && b.slot.overlaps(slot)
    })
}

pub fn has_overlap(
    candidates: &[Booking],
    slot: &TimeSlot,
    statuses: &[BookingStatus],
    exclude: Option<Ulid>,
) -> bool {
    find_conflict(candidates, slot, statuses, exclude).is_some()
}

/// User axis: live bookings (Pending or Approved) held by `user_id`.
pub fn user_conflict<'a>(
    candidates: &'a [Booking],
    user_id: Ulid,
    slot: &TimeSlot,
    exclude: Option<Ulid>,
) -> Option<&'a Booking> {
    candidates.iter().find(|b| {
        b.user_id == user_id
            && b.status.is_live()
            && exclude != Some(b.id)
            && b.slot.overlaps(slot)
    })
}

/// Room axis: live bookings on a distinct room identity.
pub fn room_conflict<'a>(
    candidates: &'a [Booking],
    room_id: Ulid,
    slot: &TimeSlot,
    exclude: Option<Ulid>,
) -> Option<&'a Booking> {
    candidates.iter().find(|b| {
        b.room_id == Some(room_id)
            && b.status.is_live()
            && exclude != Some(b.id)
            && b.slot.overlaps(slot)
    })
}

/// Account axis: only Approved bookings occupy an account.
pub fn account_conflict<'a>(
    candidates: &'a [Booking],
    account_id: Ulid,
    slot: &TimeSlot,
    exclude: Option<Ulid>,
) -> Option<&'a Booking> {
    candidates.iter().find(|b| {
        b.account_id == Some(account_id)
            && b.status == BookingStatus::Approved
            && exclude != Some(b.id)
            && b.slot.overlaps(slot)
    })
}
