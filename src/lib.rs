//! gather: a command-line RSS aggregator.
//!
//! Users register feeds; the `agg` command runs a polling loop that picks
//! the least-recently-fetched feed each tick, downloads and parses it, and
//! stores new posts with idempotent de-duplication on entry URL.

pub mod commands;
pub mod config;
pub mod feed;
pub mod ingest;
pub mod storage;
pub mod util;
