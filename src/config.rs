use crate::limits::MAX_OCCURRENCES;

/// Construction-time configuration for the scheduler. Passed explicitly —
/// there is no process-wide settings state.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Occurrence ceiling applied during series expansion. Clamped to
    /// `MAX_OCCURRENCES`; a deployment may only lower it.
    pub occurrence_cap: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            occurrence_cap: MAX_OCCURRENCES,
        }
    }
}

impl ScheduleConfig {
    /// Read overrides from the environment (`HUDDLE_OCCURRENCE_CAP`).
    pub fn from_env() -> Self {
        let occurrence_cap = std::env::var("HUDDLE_OCCURRENCE_CAP")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(MAX_OCCURRENCES)
            .min(MAX_OCCURRENCES);
        Self { occurrence_cap }
    }
}
