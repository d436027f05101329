//! Collection cycle orchestration

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::mapper;
use crate::models::MetricRecord;
use crate::query::{AnalyticsClient, QueryError};
use crate::window;
use crate::zones::{self, DirectoryError, ZoneDirectory};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

pub struct Collector {
    directory: ZoneDirectory,
    analytics: AnalyticsClient,
}

impl Collector {
    pub fn new(directory: ZoneDirectory, analytics: AnalyticsClient) -> Self {
        Self {
            directory,
            analytics,
        }
    }

    /// Run one collection cycle.
    ///
    /// All-or-nothing: a failed directory fetch or either query fails the
    /// whole cycle and yields no records. Retrying is the scheduling caller's
    /// decision, not the collector's.
    pub async fn collect(&self) -> Result<Vec<MetricRecord>, CollectError> {
        let zone_set = self.directory.zones().await?;
        let zone_ids = zones::extract_ids(&zone_set);
        if zone_ids.is_empty() {
            debug!("no zones to monitor, skipping analytics queries");
            return Ok(Vec::new());
        }

        let window = window::current_window(Utc::now());

        // The two query families are independent of each other; run them
        // concurrently.
        let (zone_data, colo_data) = tokio::try_join!(
            self.analytics.fetch_zone_totals(&zone_ids, &window),
            self.analytics.fetch_colo_totals(&zone_ids, &window),
        )?;

        let mut records = mapper::flatten_zone_response(&zone_data, &zone_set);
        records.extend(mapper::flatten_colo_response(&colo_data, &zone_set));

        debug!(
            records = records.len(),
            bucket = %window.start,
            "collection cycle complete"
        );

        Ok(records)
    }
}
