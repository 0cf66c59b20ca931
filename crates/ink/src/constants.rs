pub use stylus_config::{
    DEFAULT_COMMIT_DELAY_MS as COMMIT_DELAY_MS, DEFAULT_ERROR_WINDOW_MS as ERROR_WINDOW_MS,
    DEFAULT_PREVIEW_DISTANCE as PREVIEW_DISTANCE_THRESHOLD,
};

/// Pressure reported for devices without force sensing (mid-scale).
pub const DEFAULT_PRESSURE: u8 = 128;

/// First id handed out to a candidate stroke.
pub const FIRST_STROKE_ID: u64 = 1;
