//! Command line arguments

use std::path::PathBuf;

use clap::Parser;
use stylus_config::InkConfig;

/// Replay a recorded pen trace through the ink engine
#[derive(Parser, Debug)]
#[command(name = "stylus-replay")]
#[command(about = "Segment a recorded pen trace into strokes")]
pub struct Cli {
    /// Trace file: a JSON array of pen events, or one event per line
    #[arg(value_name = "TRACE")]
    pub trace: PathBuf,

    /// Engine config file (JSON)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the flicker error window (ms)
    #[arg(long, value_name = "MS")]
    pub error_window: Option<u64>,

    /// Override the commit delay (ms)
    #[arg(long, value_name = "MS")]
    pub commit_delay: Option<u64>,

    /// Publish previews every time the pen travels this far (0 = off)
    #[arg(long, value_name = "DISTANCE")]
    pub preview_distance: Option<f64>,

    /// Pace events by their timestamps instead of feeding them at once
    #[arg(long)]
    pub realtime: bool,

    /// Write the committed strokes to this file as JSON
    #[arg(short, long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Apply command line overrides on top of a loaded config.
    ///
    /// Overriding only the window keeps the commit delay just above it.
    pub fn apply_overrides(&self, mut config: InkConfig) -> InkConfig {
        if let Some(window) = self.error_window {
            config.error_window_ms = window;
            if self.commit_delay.is_none() && config.commit_delay_ms <= window {
                config.commit_delay_ms = window + 1;
            }
        }
        if let Some(delay) = self.commit_delay {
            config.commit_delay_ms = delay;
        }
        if let Some(distance) = self.preview_distance {
            config.preview_distance = distance;
        }
        config
    }
}
