//! Response flattening
//!
//! Turns the nested aggregate response into flat metric records. Every record
//! carries its group's zone identity and bucket datetime (plus the colo code
//! for the per-location family). A breakdown the response omits yields no
//! records for that dimension, so a missing bucket stays distinguishable from
//! a zero count.
//!
//! Malformed pieces degrade at their own granularity: a breakdown entry
//! without its dimension value drops that one breakdown, a group without its
//! bucket key drops that one group. Everything else in the response is still
//! flattened.

use thiserror::Error;
use tracing::warn;

use crate::models::{Dimension, Metric, MetricRecord, Zone};
use crate::query::response::{AnalyticsData, Breakdown};
use crate::zones::resolve_name;

#[derive(Debug, Error)]
pub enum MappingError {
    /// A breakdown entry arrived without its dimension value.
    #[error("{dimension} breakdown entry is missing its dimension value")]
    MissingDimensionValue { dimension: Dimension },

    /// An aggregate group arrived without its bucket datetime.
    #[error("aggregate group for zone {zone_id} is missing its datetime")]
    MissingDatetime { zone_id: String },

    /// A per-location group arrived without its colo code.
    #[error("aggregate group for zone {zone_id} is missing its colo code")]
    MissingColoCode { zone_id: String },
}

/// Identity shared by all records of one aggregate group.
struct GroupIdentity<'a> {
    zone_id: &'a str,
    zone_name: &'a str,
    colo_code: Option<&'a str>,
    datetime: &'a str,
}

impl GroupIdentity<'_> {
    fn scalar_record(&self, metric: Metric, value: u64) -> MetricRecord {
        self.record(Dimension::Scalar, String::new(), metric, value)
    }

    fn record(
        &self,
        dimension: Dimension,
        dimension_value: String,
        metric: Metric,
        value: u64,
    ) -> MetricRecord {
        MetricRecord {
            zone_id: self.zone_id.to_owned(),
            zone_name: self.zone_name.to_owned(),
            colo_code: self.colo_code.map(str::to_owned),
            datetime: self.datetime.to_owned(),
            dimension,
            dimension_value,
            metric,
            value,
        }
    }
}

/// Flatten one breakdown into records, one per entry and metric.
///
/// Fails if any entry lacks its dimension value; the caller skips the whole
/// breakdown in that case so no mislabeled rows are emitted.
fn flatten_breakdown(
    identity: &GroupIdentity<'_>,
    breakdown: &Breakdown,
) -> Result<Vec<MetricRecord>, MappingError> {
    let mut records = Vec::new();

    for entry in &breakdown.entries {
        let value = entry
            .value
            .as_deref()
            .ok_or(MappingError::MissingDimensionValue {
                dimension: breakdown.dimension,
            })?;

        for &(metric, metric_value) in &entry.metrics {
            records.push(identity.record(
                breakdown.dimension,
                value.to_owned(),
                metric,
                metric_value,
            ));
        }
    }

    Ok(records)
}

fn flatten_breakdowns(
    records: &mut Vec<MetricRecord>,
    identity: &GroupIdentity<'_>,
    breakdowns: &[Breakdown],
) {
    for breakdown in breakdowns {
        match flatten_breakdown(identity, breakdown) {
            Ok(mut flattened) => records.append(&mut flattened),
            Err(e) => warn!(
                zone = identity.zone_id,
                datetime = identity.datetime,
                error = %e,
                "skipping malformed breakdown"
            ),
        }
    }
}

/// Flatten a whole-zone query response.
pub fn flatten_zone_response(data: &AnalyticsData, zones: &[Zone]) -> Vec<MetricRecord> {
    let mut records = Vec::new();

    for zone in &data.viewer.zones {
        let zone_name = resolve_name(zones, &zone.zone_tag);

        for group in &zone.groups {
            let Some(datetime) = group.dimensions.datetime.as_deref() else {
                warn!(
                    zone = %zone.zone_tag,
                    error = %MappingError::MissingDatetime { zone_id: zone.zone_tag.clone() },
                    "skipping malformed aggregate group"
                );
                continue;
            };

            let identity = GroupIdentity {
                zone_id: &zone.zone_tag,
                zone_name: &zone_name,
                colo_code: None,
                datetime,
            };

            for (metric, value) in group.sum.scalars() {
                records.push(identity.scalar_record(metric, value));
            }
            records.push(identity.scalar_record(Metric::Uniques, group.unique.uniques));

            flatten_breakdowns(&mut records, &identity, &group.sum.breakdowns());
        }
    }

    records
}

/// Flatten a per-edge-location query response.
pub fn flatten_colo_response(data: &AnalyticsData, zones: &[Zone]) -> Vec<MetricRecord> {
    let mut records = Vec::new();

    for zone in &data.viewer.zones {
        let zone_name = resolve_name(zones, &zone.zone_tag);

        for group in &zone.colo_groups {
            let (Some(datetime), Some(colo_code)) = (
                group.dimensions.datetime.as_deref(),
                group.dimensions.colo_code.as_deref(),
            ) else {
                let error = if group.dimensions.datetime.is_none() {
                    MappingError::MissingDatetime {
                        zone_id: zone.zone_tag.clone(),
                    }
                } else {
                    MappingError::MissingColoCode {
                        zone_id: zone.zone_tag.clone(),
                    }
                };
                warn!(zone = %zone.zone_tag, %error, "skipping malformed aggregate group");
                continue;
            };

            let identity = GroupIdentity {
                zone_id: &zone.zone_tag,
                zone_name: &zone_name,
                colo_code: Some(colo_code),
                datetime,
            };

            for (metric, value) in group.sum.scalars() {
                records.push(identity.scalar_record(metric, value));
            }

            flatten_breakdowns(&mut records, &identity, &group.sum.breakdowns());
        }
    }

    records
}
