//! Pen input entry points for the ink engine

use crate::constants::DEFAULT_PRESSURE;
use crate::types::PenEvent;

use super::InkEngine;
use super::segmenter::SegmentOutcome;

impl InkEngine {
    /// Feed one event from the acquisition layer.
    ///
    /// Events must come from a single pen, in arrival order. This never
    /// blocks: pen-ups only schedule their commit.
    pub fn ingest(&mut self, event: PenEvent) -> SegmentOutcome {
        self.segmenter.handle(event)
    }

    /// Feed a batch of events, returning how many were not ignored.
    pub fn ingest_all(&mut self, events: impl IntoIterator<Item = PenEvent>) -> usize {
        events
            .into_iter()
            .map(|event| self.ingest(event))
            .filter(|outcome| !matches!(outcome, SegmentOutcome::Ignored(_)))
            .count()
    }

    /// Pen touched the surface
    pub fn pen_down(&mut self, x: f64, y: f64, pressure: u8, timestamp_ms: u64) -> SegmentOutcome {
        self.ingest(PenEvent::down(x, y, pressure, timestamp_ms))
    }

    /// Pen moved while down
    pub fn pen_move(&mut self, x: f64, y: f64, pressure: u8, timestamp_ms: u64) -> SegmentOutcome {
        self.ingest(PenEvent::moved(x, y, pressure, timestamp_ms))
    }

    /// Pen lifted. Position is not recorded; only the time matters.
    pub fn pen_up(&mut self, x: f64, y: f64, timestamp_ms: u64) -> SegmentOutcome {
        self.ingest(PenEvent::up(x, y, DEFAULT_PRESSURE, timestamp_ms))
    }
}
