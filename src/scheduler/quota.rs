use chrono::{Datelike, Days, NaiveDate};
use ulid::Ulid;

use crate::model::Department;
use crate::store::BookingStore;

use super::ScheduleError;

/// Monday 00:00 through Sunday of the ISO week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Days::new(date.weekday().num_days_from_monday() as u64);
    let sunday = monday + Days::new(6);
    (monday, sunday)
}

/// True iff the department's approved count in the week containing `date`
/// is below its configured ceiling. `exclude` skips a booking being
/// re-checked after an edit.
pub async fn under_weekly_limit(
    store: &dyn BookingStore,
    department: &Department,
    date: NaiveDate,
    exclude: Option<Ulid>,
) -> Result<bool, ScheduleError> {
    let (week_start, week_end) = week_bounds(date);
    let count = store
        .count_approved_in_week(department.id, week_start, week_end, exclude)
        .await
        .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;
    Ok(count < department.weekly_limit)
}
