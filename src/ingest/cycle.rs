use chrono::Utc;
use std::time::Duration;
use thiserror::Error;

use crate::feed::fetcher::{fetch_feed, FetchError};
use crate::feed::parser::{parse_feed, ParseError};
use crate::storage::{Database, DatabaseError, NewPost, PostWrite};

/// Fatal cycle-setup errors. Anything past setup is degraded-mode and is
/// reported through [`CycleOutcome`] instead, so one bad feed can never
/// halt ingestion.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("No feeds registered; add one with `addfeed` first")]
    NoFeeds,
    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// What happened to the selected feed during one cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The feed was fetched and parsed; every item was either stored or
    /// recognized as already ingested.
    Ingested { created: usize, duplicate: usize },
    /// The feed could not be fetched. No items were processed.
    FetchFailed(FetchError),
    /// The document could not be parsed. No items were processed.
    ParseFailed(ParseError),
    /// A non-duplicate storage error stopped the item loop partway.
    StoreFailed {
        created: usize,
        duplicate: usize,
        error: DatabaseError,
    },
}

/// Result of one ingestion cycle.
#[derive(Debug)]
pub struct CycleSummary {
    pub feed_id: i64,
    pub feed_name: String,
    pub feed_url: String,
    pub outcome: CycleOutcome,
}

/// Run one ingestion cycle: select the least-recently-fetched feed, mark
/// it fetched, download and parse it, and store each item in document
/// order.
///
/// # Errors
///
/// Only setup failures are errors: no feed registered, or the store
/// unreachable at selection/marking time. Fetch, parse and per-item
/// storage failures are absorbed into the [`CycleSummary`].
pub async fn run_once(
    db: &Database,
    client: &reqwest::Client,
    fetch_timeout: Duration,
) -> Result<CycleSummary, CycleError> {
    let feed = db
        .get_next_feed_to_fetch()
        .await?
        .ok_or(CycleError::NoFeeds)?;

    // Marked before the fetch: a feed that fails to fetch or parse falls
    // to the back of the rotation instead of being retried every tick.
    db.mark_feed_fetched(feed.id, Utc::now().timestamp())
        .await?;

    tracing::debug!(feed_id = feed.id, url = %feed.url, "Fetching feed");

    let summary = |outcome| CycleSummary {
        feed_id: feed.id,
        feed_name: feed.name.clone(),
        feed_url: feed.url.clone(),
        outcome,
    };

    let bytes = match fetch_feed(client, &feed.url, fetch_timeout).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(feed_id = feed.id, url = %feed.url, error = %e, "Fetch failed");
            return Ok(summary(CycleOutcome::FetchFailed(e)));
        }
    };

    let parsed = match parse_feed(&bytes) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(feed_id = feed.id, url = %feed.url, error = %e, "Parse failed");
            return Ok(summary(CycleOutcome::ParseFailed(e)));
        }
    };

    let mut created = 0usize;
    let mut duplicate = 0usize;

    for item in parsed.items {
        let title = item.title;
        let write = db
            .create_post(NewPost {
                feed_id: feed.id,
                title: title.clone(),
                url: item.link,
                description: item.description,
                published_at: item.published_at,
            })
            .await;

        match write {
            Ok(PostWrite::Created) => {
                created += 1;
                tracing::info!(feed_id = feed.id, title = %title, "post created");
            }
            Ok(PostWrite::DuplicateUrl) => {
                duplicate += 1;
                tracing::debug!(feed_id = feed.id, title = %title, "post already ingested");
            }
            Err(e) => {
                tracing::warn!(feed_id = feed.id, title = %title, error = %e, "Failed to store post");
                return Ok(summary(CycleOutcome::StoreFailed {
                    created,
                    duplicate,
                    error: e,
                }));
            }
        }
    }

    Ok(summary(CycleOutcome::Ingested { created, duplicate }))
}
