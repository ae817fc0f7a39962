use chrono::NaiveDate;

use crate::model::Closure;

/// Find the active closure covering `date`, if any. Ties between
/// overlapping closures resolve to the earliest `start_date`. Pure and
/// infallible; no closure data means allowed.
pub fn active_closure_for(closures: &[Closure], date: NaiveDate) -> Option<&Closure> {
    closures
        .iter()
        .filter(|c| c.covers(date))
        .min_by_key(|c| c.start_date)
}
