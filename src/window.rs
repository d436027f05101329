//! Trailing time window calculation
//!
//! The analytics API aggregates traffic into one-minute buckets and needs a
//! few minutes before a bucket is fully materialized. Queries therefore target
//! the bucket that started `AGGREGATION_LAG_SECS` ago, truncated to the bucket
//! granularity.

use chrono::{DateTime, Utc};

use crate::models::TimeWindow;

/// Seconds the upstream aggregation is allowed to lag before a bucket is
/// considered complete.
pub const AGGREGATION_LAG_SECS: i64 = 180;

/// Bucket size of the aggregate groups the API reports.
pub const BUCKET_GRANULARITY_SECS: i64 = 60;

/// Compute the window for an arbitrary clock reading, lag, and granularity.
///
/// Pure: subtract the lag, then truncate down to the nearest granularity
/// multiple. Truncation always rounds toward the past so the window never
/// names a bucket that has not closed yet.
pub fn window_at(now: DateTime<Utc>, lag_secs: i64, granularity_secs: i64) -> TimeWindow {
    let lagged = now.timestamp() - lag_secs;
    let start = lagged.div_euclid(granularity_secs) * granularity_secs;

    TimeWindow {
        // Seconds-precision timestamps derived from a real clock are in range.
        start: DateTime::from_timestamp(start, 0).expect("bucket timestamp out of range"),
        granularity_secs,
    }
}

/// Window to query right now, with the observed upstream defaults.
pub fn current_window(now: DateTime<Utc>) -> TimeWindow {
    window_at(now, AGGREGATION_LAG_SECS, BUCKET_GRANULARITY_SECS)
}
