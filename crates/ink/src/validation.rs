use crate::types::Sample;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Non-finite coordinates: ({x}, {y})")]
    NonFiniteCoordinates { x: f64, y: f64 },
    #[error("Timestamp regression: {timestamp_ms} ms is earlier than {previous_ms} ms")]
    TimestampRegression { timestamp_ms: u64, previous_ms: u64 },
}

/// Validate a sample's coordinates
pub fn validate_sample(sample: &Sample) -> Result<(), ValidationError> {
    if !sample.x.is_finite() || !sample.y.is_finite() {
        return Err(ValidationError::NonFiniteCoordinates {
            x: sample.x,
            y: sample.y,
        });
    }

    Ok(())
}

/// Check that a sample does not step back in time.
///
/// Equal timestamps are allowed; devices commonly report several samples
/// within one millisecond.
pub fn validate_ordering(sample: &Sample, previous_ms: Option<u64>) -> Result<(), ValidationError> {
    match previous_ms {
        Some(previous_ms) if sample.timestamp_ms < previous_ms => {
            Err(ValidationError::TimestampRegression {
                timestamp_ms: sample.timestamp_ms,
                previous_ms,
            })
        }
        _ => Ok(()),
    }
}
