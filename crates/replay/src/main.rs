//! Stylus replay - feed a recorded pen trace through the ink engine
//!
//! Stands in for the acquisition layer: events are read from a file and
//! delivered to the engine in order, optionally paced by their timestamps.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ink::{ContentChange, InkEngine, PenEvent, SegmentOutcome};
use stylus_config::InkConfig;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod trace;

use cli::Cli;

/// Extra wait after the last event so every pending commit can fire
const SETTLE_MARGIN: Duration = Duration::from_millis(50);

#[derive(Debug, Default)]
struct ReplayStats {
    started: usize,
    merged: usize,
    ignored: usize,
}

impl ReplayStats {
    fn record(&mut self, outcome: &SegmentOutcome) {
        match outcome {
            SegmentOutcome::Started { .. } => self.started += 1,
            SegmentOutcome::Merged { .. } => self.merged += 1,
            SegmentOutcome::Ignored(_) => self.ignored += 1,
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => InkConfig::load(path)?,
        None => InkConfig::default(),
    };
    let config = cli.apply_overrides(config.with_env_overrides());

    let events = trace::load_trace(&cli.trace)?;
    info!(events = events.len(), trace = %cli.trace.display(), "loaded trace");

    let mut engine = InkEngine::new(config)?;

    let previews = Arc::new(AtomicUsize::new(0));
    {
        let previews = Arc::clone(&previews);
        engine.subscribe(move |change| {
            if let ContentChange::PreviewUpdated { .. } = change {
                previews.fetch_add(1, Ordering::Relaxed);
            }
        });
    }

    let stats = replay(&mut engine, &events, cli.realtime).await;

    tokio::time::sleep(engine.config().commit_delay() + SETTLE_MARGIN).await;

    let strokes = engine.all_strokes();
    println!("{} strokes from {} events", strokes.len(), events.len());
    for stroke in &strokes {
        println!(
            "  stroke {:>4}: {:>5} samples, {:>8} ms .. {:>8} ms",
            stroke.id,
            stroke.len(),
            stroke.first_timestamp().unwrap_or(0),
            stroke.last_timestamp().unwrap_or(0),
        );
    }
    println!(
        "started {}, flicker merges {}, ignored events {}, preview updates {}",
        stats.started,
        stats.merged,
        stats.ignored,
        previews.load(Ordering::Relaxed)
    );

    if let Some(path) = &cli.export {
        engine.export_snapshot().write_to(path)?;
        info!(path = %path.display(), "exported strokes");
    }

    Ok(())
}

async fn replay(engine: &mut InkEngine, events: &[PenEvent], realtime: bool) -> ReplayStats {
    let mut stats = ReplayStats::default();
    let mut previous_ms: Option<u64> = None;

    for event in events {
        if realtime
            && let Some(previous_ms) = previous_ms
        {
            let wait = event.sample.timestamp_ms.saturating_sub(previous_ms);
            tokio::time::sleep(Duration::from_millis(wait)).await;
        }
        previous_ms = Some(event.sample.timestamp_ms);

        let outcome = engine.ingest(*event);
        debug!(?outcome, "event");
        if let SegmentOutcome::Ignored(reason) = &outcome {
            warn!(?reason, t = event.sample.timestamp_ms, "event ignored");
        }
        stats.record(&outcome);
    }

    stats
}
