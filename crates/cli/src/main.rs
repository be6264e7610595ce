//! meetups entry point.
//!
//! Composition root: loads configuration, opens the store, registers the
//! admin snippets and reports whether upstream meetup data is due a refresh.
//! Logging goes to stderr as JSON.

use anyhow::{Context, Result};
use meetups_core::{AppConfig, Event, MeetupDb, SnippetRegistry};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(db_path = %config.db_path.display(), "opening meetups store");

    let db = MeetupDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    let mut registry = SnippetRegistry::new();
    registry.register::<Event>();
    tracing::info!(snippets = ?registry.names().collect::<Vec<_>>(), "registered snippets");

    let marker = db.marker().await?;
    if db.is_marker_stale(config.refresh_interval()).await? {
        tracing::info!(last_refresh = ?marker, "meetup data is stale; refresh due");
    } else {
        tracing::info!(last_refresh = ?marker, "meetup data is fresh");
    }

    let upcoming = db.future_events().limit(config.upcoming_limit).fetch().await?;
    tracing::info!(count = upcoming.len(), "upcoming meetups");
    for event in &upcoming {
        tracing::info!(id = %event.id, time = %event.time, rsvps = event.rsvps, "{event}");
    }

    Ok(())
}
