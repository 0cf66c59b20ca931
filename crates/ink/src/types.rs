use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A single timestamped reading from the pen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    /// Pen force 0..=255
    pub pressure: u8,
    /// Capture time in milliseconds
    pub timestamp_ms: u64,
}

impl Sample {
    pub fn new(x: f64, y: f64, pressure: u8, timestamp_ms: u64) -> Self {
        Self {
            x,
            y,
            pressure,
            timestamp_ms,
        }
    }

    /// Euclidean distance to another sample
    pub fn distance_to(&self, other: &Sample) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Pen state transition carried alongside each sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenPhase {
    Down,
    Move,
    Up,
}

/// One event from the acquisition layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenEvent {
    pub phase: PenPhase,
    #[serde(flatten)]
    pub sample: Sample,
}

impl PenEvent {
    pub fn down(x: f64, y: f64, pressure: u8, timestamp_ms: u64) -> Self {
        Self {
            phase: PenPhase::Down,
            sample: Sample::new(x, y, pressure, timestamp_ms),
        }
    }

    pub fn moved(x: f64, y: f64, pressure: u8, timestamp_ms: u64) -> Self {
        Self {
            phase: PenPhase::Move,
            sample: Sample::new(x, y, pressure, timestamp_ms),
        }
    }

    pub fn up(x: f64, y: f64, pressure: u8, timestamp_ms: u64) -> Self {
        Self {
            phase: PenPhase::Up,
            sample: Sample::new(x, y, pressure, timestamp_ms),
        }
    }
}

/// Identifier shared by a candidate stroke, its previews and its commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeId(pub u64);

impl fmt::Display for StrokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned bounding box of a set of samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl StrokeBounds {
    /// Bounds of the given samples, or None if there are none
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a Sample>) -> Option<Self> {
        let mut iter = samples.into_iter();
        let first = iter.next()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(iter.fold(init, |b, s| Self {
            min_x: b.min_x.min(s.x),
            min_y: b.min_y.min(s.y),
            max_x: b.max_x.max(s.x),
            max_y: b.max_y.max(s.y),
        }))
    }

    /// Smallest box containing both
    pub fn union(&self, other: &StrokeBounds) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// One continuous pen-down to pen-up motion
///
/// Samples are shared behind an `Arc`, so cloning a stroke (for snapshots
/// handed to consumers) never copies sample data. A stroke is never mutated
/// after construction; previews are replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    samples: Arc<[Sample]>,
}

impl Stroke {
    /// Build a stroke from samples in temporal order
    pub fn new(id: StrokeId, samples: impl Into<Arc<[Sample]>>) -> Self {
        Self {
            id,
            samples: samples.into(),
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp of the first sample
    pub fn first_timestamp(&self) -> Option<u64> {
        self.samples.first().map(|s| s.timestamp_ms)
    }

    /// Timestamp of the last sample
    pub fn last_timestamp(&self) -> Option<u64> {
        self.samples.last().map(|s| s.timestamp_ms)
    }

    /// Time between first and last sample
    pub fn duration_ms(&self) -> u64 {
        match (self.first_timestamp(), self.last_timestamp()) {
            (Some(first), Some(last)) => last.saturating_sub(first),
            _ => 0,
        }
    }

    pub fn bounds(&self) -> Option<StrokeBounds> {
        StrokeBounds::from_samples(self.samples.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f64, y: f64, t: u64) -> Sample {
        Sample::new(x, y, 128, t)
    }

    #[test]
    fn test_stroke_timestamps() {
        let stroke = Stroke::new(
            StrokeId(1),
            vec![sample(0.0, 0.0, 10), sample(1.0, 1.0, 15), sample(2.0, 0.0, 40)],
        );
        assert_eq!(stroke.first_timestamp(), Some(10));
        assert_eq!(stroke.last_timestamp(), Some(40));
        assert_eq!(stroke.duration_ms(), 30);
        assert_eq!(stroke.len(), 3);
    }

    #[test]
    fn test_empty_stroke() {
        let stroke = Stroke::new(StrokeId(1), Vec::<Sample>::new());
        assert!(stroke.is_empty());
        assert_eq!(stroke.last_timestamp(), None);
        assert_eq!(stroke.duration_ms(), 0);
        assert!(stroke.bounds().is_none());
    }

    #[test]
    fn test_bounds() {
        let stroke = Stroke::new(
            StrokeId(1),
            vec![sample(3.0, -1.0, 0), sample(-2.0, 4.0, 1), sample(1.0, 1.0, 2)],
        );
        let bounds = stroke.bounds().unwrap();
        assert_eq!(bounds.min_x, -2.0);
        assert_eq!(bounds.max_x, 3.0);
        assert_eq!(bounds.min_y, -1.0);
        assert_eq!(bounds.max_y, 4.0);
        assert_eq!(bounds.width(), 5.0);
        assert_eq!(bounds.height(), 5.0);
    }

    #[test]
    fn test_clone_shares_samples() {
        let stroke = Stroke::new(StrokeId(7), vec![sample(0.0, 0.0, 0)]);
        let copy = stroke.clone();
        assert!(std::ptr::eq(stroke.samples(), copy.samples()));
    }

    #[test]
    fn test_pen_event_json() {
        let json = r#"{"phase":"down","x":1.5,"y":2.0,"pressure":128,"timestamp_ms":42}"#;
        let event: PenEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, PenEvent::down(1.5, 2.0, 128, 42));
    }

    #[test]
    fn test_distance() {
        assert_eq!(sample(0.0, 0.0, 0).distance_to(&sample(3.0, 4.0, 1)), 5.0);
    }
}
