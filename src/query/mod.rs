//! Aggregate analytics queries
//!
//! Two query families against the same endpoint: whole-zone buckets and
//! per-edge-location buckets. Both take the same `{zoneIDs, time, limit}`
//! variables and differ only in the grouping family they request.

pub mod client;
pub mod response;

pub use client::{AnalyticsClient, QueryError};
pub use response::{AnalyticsData, Breakdown, BreakdownEntry, Envelope};
