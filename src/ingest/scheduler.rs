use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::ingest::cycle::{self, CycleError, CycleOutcome};
use crate::storage::Database;

/// Deadline for each feed fetch. Bounds a hung network call so it cannot
/// stall the tick loop past one cycle.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Drive ingestion cycles at a fixed interval, one feed per tick, until
/// the process is terminated.
///
/// The first cycle runs immediately; a tick that lands while a cycle is
/// still in flight is delayed rather than stacked. Degraded per-feed
/// outcomes are logged and the loop continues; only a fatal setup error
/// from [`cycle::run_once`] returns.
pub async fn run(
    db: Database,
    client: reqwest::Client,
    interval: Duration,
) -> Result<(), CycleError> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let summary = cycle::run_once(&db, &client, FETCH_TIMEOUT).await?;
        match &summary.outcome {
            CycleOutcome::Ingested { created, duplicate } => {
                tracing::info!(
                    feed = %summary.feed_name,
                    created = *created,
                    duplicate = *duplicate,
                    "Cycle complete"
                );
            }
            CycleOutcome::FetchFailed(e) => {
                tracing::warn!(
                    feed = %summary.feed_name,
                    url = %summary.feed_url,
                    error = %e,
                    "Cycle degraded: fetch failed"
                );
            }
            CycleOutcome::ParseFailed(e) => {
                tracing::warn!(
                    feed = %summary.feed_name,
                    url = %summary.feed_url,
                    error = %e,
                    "Cycle degraded: parse failed"
                );
            }
            CycleOutcome::StoreFailed {
                created,
                duplicate,
                error,
            } => {
                tracing::warn!(
                    feed = %summary.feed_name,
                    created = *created,
                    duplicate = *duplicate,
                    error = %error,
                    "Cycle degraded: storage error stopped item processing"
                );
            }
        }
    }
}
