/// Hard ceiling on expanded occurrences per recurring series, regardless
/// of the requested count.
pub const MAX_OCCURRENCES: u32 = 50;

/// Max length of a reject/cancel audit reason.
pub const MAX_REASON_LEN: usize = 1024;

/// Max length of an external occurrence/series identifier.
pub const MAX_EXTERNAL_ID_LEN: usize = 256;
