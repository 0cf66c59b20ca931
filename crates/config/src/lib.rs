//! Shared configuration for Stylus
//!
//! This crate provides the single source of truth for the stroke segmentation
//! tunables shared by the engine and its front ends (the replay CLI, embedding
//! applications).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default debounce window in milliseconds.
///
/// 20 ms is faster than a person can lift and re-touch a pen, so a pen-up
/// followed by a pen-down inside this window is treated as hardware flicker.
pub const DEFAULT_ERROR_WINDOW_MS: u64 = 20;

/// Default delay before a lifted stroke is committed, in milliseconds.
/// Must stay above the error window.
pub const DEFAULT_COMMIT_DELAY_MS: u64 = 21;

/// Default preview distance threshold (0 = previews disabled)
pub const DEFAULT_PREVIEW_DISTANCE: f64 = 0.0;

const ENV_ERROR_WINDOW: &str = "STYLUS_ERROR_WINDOW_MS";
const ENV_COMMIT_DELAY: &str = "STYLUS_COMMIT_DELAY_MS";
const ENV_PREVIEW_DISTANCE: &str = "STYLUS_PREVIEW_DISTANCE";

/// Errors produced while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("commit delay ({commit_delay_ms} ms) must exceed the error window ({error_window_ms} ms)")]
    CommitDelayTooShort {
        error_window_ms: u64,
        commit_delay_ms: u64,
    },

    #[error("preview distance must be finite and non-negative, got {0}")]
    InvalidPreviewDistance(f64),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for the ink segmentation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InkConfig {
    /// Pen-up to pen-down gap (ms) at or below which the two are merged
    pub error_window_ms: u64,
    /// Delay (ms) between a pen-up and the commit of its stroke
    pub commit_delay_ms: u64,
    /// Distance the pen must travel before an in-progress stroke is
    /// published as a preview. 0 disables previews.
    pub preview_distance: f64,
}

impl Default for InkConfig {
    fn default() -> Self {
        Self {
            error_window_ms: DEFAULT_ERROR_WINDOW_MS,
            commit_delay_ms: DEFAULT_COMMIT_DELAY_MS,
            preview_distance: DEFAULT_PREVIEW_DISTANCE,
        }
    }
}

impl InkConfig {
    /// Create a config with the given window and a commit delay 1 ms above it
    pub fn with_error_window(error_window_ms: u64) -> Self {
        Self {
            error_window_ms,
            commit_delay_ms: error_window_ms + 1,
            ..Self::default()
        }
    }

    /// Set the preview distance threshold
    pub fn preview_distance(mut self, distance: f64) -> Self {
        self.preview_distance = distance;
        self
    }

    /// Check the invariants between the tunables.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.commit_delay_ms <= self.error_window_ms {
            return Err(ConfigError::CommitDelayTooShort {
                error_window_ms: self.error_window_ms,
                commit_delay_ms: self.commit_delay_ms,
            });
        }
        if !self.preview_distance.is_finite() || self.preview_distance < 0.0 {
            return Err(ConfigError::InvalidPreviewDistance(self.preview_distance));
        }
        Ok(())
    }

    /// Whether distance-based previews are enabled
    pub fn preview_enabled(&self) -> bool {
        self.preview_distance > 0.0
    }

    /// Error window as a Duration
    pub fn error_window(&self) -> Duration {
        Duration::from_millis(self.error_window_ms)
    }

    /// Commit delay as a Duration
    pub fn commit_delay(&self) -> Duration {
        Duration::from_millis(self.commit_delay_ms)
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Apply overrides from `STYLUS_*` environment variables.
    ///
    /// Variables that are unset or fail to parse leave the field untouched.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup(ENV_ERROR_WINDOW).and_then(|s| s.trim().parse().ok()) {
            self.error_window_ms = v;
        }
        if let Some(v) = lookup(ENV_COMMIT_DELAY).and_then(|s| s.trim().parse().ok()) {
            self.commit_delay_ms = v;
        }
        if let Some(v) = lookup(ENV_PREVIEW_DISTANCE).and_then(|s| s.trim().parse().ok()) {
            self.preview_distance = v;
        }
        self
    }
}
