//! Periodic fetch loop.
//!
//! Probes every source once at startup, then runs `fetch_all` on a fixed
//! interval until shutdown is requested.

use std::sync::Arc;
use std::time::Duration;

use armory_feeds::{AggregateResult, HealthStatus, Orchestrator};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs until `shutdown` is cancelled.
pub async fn run_scheduler(
    orchestrator: Arc<Orchestrator>,
    every: Duration,
    shutdown: CancellationToken,
) {
    info!("Feed scheduler started ({}s interval)", every.as_secs());
    probe_sources(&orchestrator).await;

    // First tick is immediate, subsequent ticks are `every` apart
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Feed scheduler stopping");
                break;
            }
            _ = ticker.tick() => {
                run_scheduled_fetch(&orchestrator).await;
            }
        }
    }
}

/// Runs a single fetch and logs its outcome.
pub async fn run_scheduled_fetch(orchestrator: &Orchestrator) -> AggregateResult {
    debug!("Running scheduled fetch...");
    let result = orchestrator.fetch_all().await;
    log_result(&result);

    let overall = orchestrator.overall_health();
    if overall.status != HealthStatus::Healthy {
        warn!(
            "Overall feed health is {} ({} healthy, {} degraded, {} down of {})",
            overall.status.as_str(),
            overall.healthy_count,
            overall.degraded_count,
            overall.down_count,
            overall.total_count
        );
    }
    result
}

async fn probe_sources(orchestrator: &Orchestrator) {
    for record in orchestrator.check_health().await {
        match record.status {
            HealthStatus::Healthy => {
                info!(
                    "Source '{}' is reachable ({:.0}ms)",
                    record.provider_name, record.average_latency_ms
                );
            }
            _ => {
                warn!(
                    "Source '{}' failed its startup probe: {}",
                    record.provider_name,
                    record.message.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
}

fn log_result(result: &AggregateResult) {
    let meta = &result.metadata;
    info!(
        "Scheduled fetch completed in {}ms: {} sources succeeded, {} failed",
        meta.total_duration_ms, meta.success_count, meta.failure_count
    );
    for error in &meta.errors {
        warn!("Source '{}' {:?}: {}", error.provider, error.status, error.message);
    }
    if !result.has_any_success() && !meta.errors.is_empty() {
        warn!("Every source failed in this run");
    }
}
