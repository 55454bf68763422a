use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use matchstats::{
    config::{Cli, Config, DEFAULT_LOG_FILTER},
    stats::{JsonDirectoryRepository, StatsService},
    AggregationReport, StatsError,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from(Cli::parse());

    match run(&config).await {
        Ok(report) => match render(&report, config.pretty) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!(%err, "Failed to serialize report");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            error!(%err, "Aggregation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> Result<AggregationReport, StatsError> {
    info!(records_dir = %config.records_dir.display(), "Loading match records");

    if config.identity.is_none() {
        warn!("No display name or connect code given; no match will resolve");
    }

    let repository = Arc::new(JsonDirectoryRepository::new(&config.records_dir));
    let service = StatsService::new(repository);

    let report = match &config.matches {
        Some(match_ids) => {
            service
                .aggregate_matches(match_ids, config.identity.as_ref())
                .await?
        }
        None => service.aggregate_all(config.identity.as_ref()).await?,
    };

    info!("{}", report.coverage_label());
    for exclusion in report.unsupported() {
        warn!(match_id = %exclusion.match_id, issue = %exclusion.issue, "Unsupported match");
    }

    Ok(report)
}

fn render(report: &AggregationReport, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    }
}
