use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use edgescope::collector::Collector;
use edgescope::config::Config;
use edgescope::export::{Exporter, JsonLinesExporter};
use edgescope::query::AnalyticsClient;
use edgescope::zones::ZoneDirectory;

#[derive(Parser, Debug)]
#[command(name = "edgescope", about = "Zone traffic analytics collector")]
struct Args {
    /// Run a single collection cycle and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let http = reqwest::Client::builder()
        .user_agent(concat!("edgescope/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.api.request_timeout_secs))
        .build()?;

    let directory = ZoneDirectory::new(
        http.clone(),
        config.api.clone(),
        Duration::from_secs(config.collector.zone_refresh_secs),
    );
    let analytics = AnalyticsClient::new(http, config.api.clone());
    let collector = Collector::new(directory, analytics);
    let exporter = JsonLinesExporter;

    if args.once {
        let records = collector.collect().await?;
        info!(records = records.len(), "collection cycle complete");
        exporter.export(&records).await?;
        return Ok(());
    }

    info!(
        interval_secs = config.collector.poll_interval_secs,
        "starting collection loop"
    );
    let mut ticker = tokio::time::interval(Duration::from_secs(
        config.collector.poll_interval_secs.max(1),
    ));

    loop {
        ticker.tick().await;

        // A failed cycle is logged and skipped; the next tick starts fresh.
        match collector.collect().await {
            Ok(records) => {
                info!(records = records.len(), "collection cycle complete");
                if let Err(e) = exporter.export(&records).await {
                    error!("Failed to export records: {e}");
                }
            }
            Err(e) => error!("Collection cycle failed: {e}"),
        }
    }
}
