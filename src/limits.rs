//! Hard bounds and documented defaults.

/// Daily capacity applied when a campus has no `BookingSetting` row.
pub const DEFAULT_MAX_BOOKINGS_PER_DAY: u32 = 50;

/// How many days past the source date the auto allocator searches before
/// giving up with `PlacementNotFound`.
pub const DEFAULT_SEARCH_HORIZON_DAYS: u32 = 365;

/// Upper bound on one reschedule or triage batch.
pub const MAX_BATCH_SIZE: usize = 500;

/// Widest window accepted by `range_summary`.
pub const MAX_SUMMARY_WINDOW_DAYS: u32 = 366;

/// Patient name length cap.
pub const MAX_NAME_LEN: usize = 256;
