//! Downstream exporter seam
//!
//! The collector hands each successful cycle's full record sequence to an
//! [`Exporter`]. Cycles are all-or-nothing, so exporters never observe a
//! partial cycle.

use async_trait::async_trait;

use crate::models::MetricRecord;

#[async_trait]
pub trait Exporter: Send + Sync {
    /// Consume one collection cycle's records.
    async fn export(&self, records: &[MetricRecord]) -> anyhow::Result<()>;
}

/// Writes one JSON object per record to stdout, suitable for piping into a
/// metrics backend's ingestion tooling.
pub struct JsonLinesExporter;

#[async_trait]
impl Exporter for JsonLinesExporter {
    async fn export(&self, records: &[MetricRecord]) -> anyhow::Result<()> {
        use std::io::Write;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for record in records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;

        Ok(())
    }
}
