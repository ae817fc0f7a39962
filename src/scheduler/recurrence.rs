use std::collections::HashSet;

use chrono::{Duration, Months, NaiveDateTime};
use tracing::warn;

use crate::model::{BookingRequest, RecurringSeries, TimeSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrencePattern {
    fn parse(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "daily" => Some(RecurrencePattern::Daily),
            "weekly" => Some(RecurrencePattern::Weekly),
            "monthly" => Some(RecurrencePattern::Monthly),
            _ => None,
        }
    }
}

/// Dedup verdict for a single occurrence import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportDecision {
    Fresh,
    Duplicate,
}

/// Start of occurrence `i` for the given pattern, or None on calendar
/// overflow (the expansion stops there).
fn occurrence_start(
    anchor: NaiveDateTime,
    pattern: RecurrencePattern,
    interval: u32,
    i: u32,
) -> Option<NaiveDateTime> {
    match pattern {
        RecurrencePattern::Daily => {
            anchor.checked_add_signed(Duration::days(i64::from(interval) * i64::from(i)))
        }
        RecurrencePattern::Weekly => {
            anchor.checked_add_signed(Duration::days(7 * i64::from(interval) * i64::from(i)))
        }
        RecurrencePattern::Monthly => {
            let months = interval.checked_mul(i)?;
            anchor.checked_add_months(Months::new(months))
        }
    }
}

/// Expand a series definition into concrete booking requests, capped at
/// `cap` occurrences regardless of the requested count. Unknown pattern
/// labels fall back to weekly (recoverable, warned, never fatal). Each
/// request carries the series id and a synthesized per-occurrence external
/// id; a window that would cross midnight is carried through as-is and
/// rejected by the submit pipeline's interval validation.
pub fn expand(series: &RecurringSeries, cap: u32) -> Vec<BookingRequest> {
    let pattern = match RecurrencePattern::parse(&series.pattern) {
        Some(p) => p,
        None => {
            warn!(
                series = %series.external_series_id,
                pattern = %series.pattern,
                "unknown recurrence pattern, falling back to weekly"
            );
            metrics::counter!(crate::observability::RECURRENCE_FALLBACKS_TOTAL).increment(1);
            RecurrencePattern::Weekly
        }
    };
    let interval = series.interval.max(1);
    let count = series.occurrences.min(cap);

    let mut requests = Vec::with_capacity(count as usize);
    for i in 0..count {
        let Some(start_dt) = occurrence_start(series.anchor, pattern, interval, i) else {
            break;
        };
        let Some(end_dt) =
            start_dt.checked_add_signed(Duration::minutes(i64::from(series.duration_min)))
        else {
            break;
        };
        requests.push(BookingRequest {
            user_id: series.user_id,
            department_id: series.department_id,
            date: start_dt.date(),
            // Built as a raw struct: a cross-midnight window wraps end before
            // start and is rejected at submit, not here.
            slot: TimeSlot {
                start: start_dt.time(),
                end: end_dt.time(),
            },
            room_id: series.room_id,
            series_id: series.series_id,
            external_occurrence_id: Some(occurrence_external_id(
                &series.external_series_id,
                i,
            )),
            external_series_id: Some(series.external_series_id.clone()),
        });
    }
    requests
}

/// Synthesized per-occurrence identity: stable across repeated expansions
/// of the same series, which is what makes imports idempotent.
pub fn occurrence_external_id(series_external_id: &str, index: u32) -> String {
    format!("{series_external_id}#{index}")
}

/// Pure dedup check against already-imported external occurrence ids.
/// A draft without an external id can never be deduped and is always fresh.
pub fn import_decision(draft: &BookingRequest, existing: &HashSet<String>) -> ImportDecision {
    match &draft.external_occurrence_id {
        Some(ext) if existing.contains(ext) => ImportDecision::Duplicate,
        _ => ImportDecision::Fresh,
    }
}
