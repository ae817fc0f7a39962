use std::net::SocketAddr;

use crate::scheduler::ScheduleError;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: booking submissions. Labels: outcome.
pub const SUBMISSIONS_TOTAL: &str = "huddle_submissions_total";

/// Counter: approval attempts. Labels: outcome.
pub const APPROVALS_TOTAL: &str = "huddle_approvals_total";

/// Counter: explicit rejections and cancellations. Labels: action.
pub const DECISIONS_TOTAL: &str = "huddle_decisions_total";

/// Counter: series occurrences skipped as already imported.
pub const IMPORT_DUPLICATES_TOTAL: &str = "huddle_import_duplicates_total";

/// Counter: unknown recurrence patterns that fell back to weekly.
pub const RECURRENCE_FALLBACKS_TOTAL: &str = "huddle_recurrence_fallbacks_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Histogram: accounts probed per allocation attempt.
pub const ALLOCATION_PROBES: &str = "huddle_allocation_probes";

/// Counter: remote provider calls that failed after local approval.
pub const REMOTE_SYNC_FAILURES_TOTAL: &str = "huddle_remote_sync_failures_total";

/// Install the process-wide tracing subscriber. Called once by the
/// embedding application before any scheduler activity.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}

/// Install the Prometheus metrics exporter on the given port. No-op if
/// port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a domain outcome to a short label for metrics.
pub fn outcome_label(err: &ScheduleError) -> &'static str {
    match err {
        ScheduleError::ClosureBlocked(_) => "closure_blocked",
        ScheduleError::UserConflict(_) => "user_conflict",
        ScheduleError::ResourceConflict(_) => "resource_conflict",
        ScheduleError::QuotaExceeded(_) => "quota_exceeded",
        ScheduleError::NoAccountAvailable => "no_account_available",
        ScheduleError::AlreadyExists(_) => "already_exists",
        ScheduleError::InvalidInterval => "invalid_interval",
        ScheduleError::UnknownDepartment(_) => "unknown_department",
        ScheduleError::NotFound(_) => "not_found",
        ScheduleError::InvalidTransition(_) => "invalid_transition",
        ScheduleError::ReasonRequired => "reason_required",
        ScheduleError::LimitExceeded(_) => "limit_exceeded",
        ScheduleError::Unavailable(_) => "unavailable",
    }
}
