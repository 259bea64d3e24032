mod config;
mod http_source;
mod scheduler;

use std::sync::Arc;

use armory_feeds::Orchestrator;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use config::{load_sources, Config};
use http_source::HttpJsonSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    let orchestrator = Arc::new(Orchestrator::new(config.orchestrator.clone())?);
    let client = HttpJsonSource::default_client();
    for spec in load_sources(&config.sources_file)? {
        orchestrator.register(spec.into_provider(&client)?)?;
    }
    let stats = orchestrator.stats();
    tracing::info!(
        "Loaded {} sources from {} ({} enabled)",
        stats.total,
        config.sources_file.display(),
        stats.enabled
    );

    if config.run_once {
        let result = scheduler::run_scheduled_fetch(&orchestrator).await;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    scheduler::run_scheduler(orchestrator.clone(), config.interval, shutdown).await;

    let metrics = orchestrator.metrics();
    tracing::info!(
        "Worker exiting after {} runs ({} with no successful source)",
        metrics.total_runs,
        metrics.runs_with_no_success
    );
    Ok(())
}

fn init_tracing() {
    let log_format = std::env::var("ARMORY_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}
