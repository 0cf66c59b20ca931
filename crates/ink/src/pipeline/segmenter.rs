//! Pen event segmentation with pen-up flicker filtering

use std::sync::Arc;

use stylus_config::InkConfig;
use tokio::runtime::Handle;
use tracing::{debug, trace};

use crate::constants::FIRST_STROKE_ID;
use crate::log::StrokeStore;
use crate::types::{PenEvent, PenPhase, Sample, Stroke, StrokeId};
use crate::validation::{ValidationError, validate_ordering, validate_sample};

use super::commit::{CommitHandle, DelayedCommitScheduler};

/// Segmenter state between events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// No stroke in progress
    Idle,
    /// Pen is down, samples go into the candidate stroke
    Collecting,
    /// Pen lifted, candidate is waiting on its delayed commit and may still
    /// be resumed by a pen-down inside the error window
    Lifted,
}

/// Why an event was dropped
#[derive(Debug, Clone, PartialEq)]
pub enum IgnoreReason {
    /// Move or Up with no pen-down in effect
    NotCollecting(PenPhase),
    Invalid(ValidationError),
}

/// What the segmenter did with one event
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentOutcome {
    /// A new candidate stroke was started
    Started { stroke_id: StrokeId },
    /// Pen-down within the error window; the lifted stroke was resumed
    Merged { stroke_id: StrokeId, gap_ms: u64 },
    /// Sample appended to the candidate
    Appended { stroke_id: StrokeId },
    /// Sample appended and the candidate published as a preview
    PreviewPublished { stroke_id: StrokeId },
    /// Candidate handed to the delayed commit
    Lifted { stroke_id: StrokeId },
    Ignored(IgnoreReason),
}

/// Turns a stream of pen events into strokes.
///
/// Every pen-up schedules a delayed commit of the candidate stroke instead
/// of committing it on the spot. If the next pen-down arrives no later than
/// `error_window_ms` after the pen-up (measured in sample time), the pen-up
/// is treated as hardware flicker: the pending commit is cancelled and the
/// same candidate keeps growing. Otherwise the pending commit is left to
/// fire and a new stroke begins.
///
/// The candidate's samples stay owned by the segmenter. The scheduler gets
/// an immutable copy at pen-up, and the candidate is only appended to again
/// after that copy's commit has been successfully cancelled.
#[derive(Debug)]
pub struct StrokeSegmenter {
    error_window_ms: u64,
    /// Preview threshold, None when previews are off
    preview_distance: Option<f64>,
    state: SegmenterState,
    candidate: Vec<Sample>,
    candidate_id: StrokeId,
    next_id: u64,
    last_pen_up_ms: Option<u64>,
    last_timestamp_ms: Option<u64>,
    /// Path length travelled since the last preview
    distance: f64,
    /// Last position used for distance accumulation
    anchor: Option<Sample>,
    /// Most recent preview published for the candidate
    preview_id: Option<StrokeId>,
    pending: Option<CommitHandle>,
    store: Arc<StrokeStore>,
    scheduler: DelayedCommitScheduler,
}

impl StrokeSegmenter {
    /// Create a segmenter writing into `store`, running its commit worker on
    /// `runtime`.
    pub fn new(config: &InkConfig, store: Arc<StrokeStore>, runtime: &Handle) -> Self {
        let scheduler = DelayedCommitScheduler::new(Arc::clone(&store), config.commit_delay(), runtime);
        Self {
            error_window_ms: config.error_window_ms,
            preview_distance: config.preview_enabled().then_some(config.preview_distance),
            state: SegmenterState::Idle,
            candidate: Vec::new(),
            candidate_id: StrokeId(FIRST_STROKE_ID),
            next_id: FIRST_STROKE_ID,
            last_pen_up_ms: None,
            last_timestamp_ms: None,
            distance: 0.0,
            anchor: None,
            preview_id: None,
            pending: None,
            store,
            scheduler,
        }
    }

    /// Process one event. Never fails; bad events are ignored.
    pub fn handle(&mut self, event: PenEvent) -> SegmentOutcome {
        let sample = event.sample;
        if let Err(err) = validate_sample(&sample)
            .and_then(|()| validate_ordering(&sample, self.last_timestamp_ms))
        {
            debug!(phase = ?event.phase, error = %err, "ignoring invalid pen event");
            return SegmentOutcome::Ignored(IgnoreReason::Invalid(err));
        }
        self.last_timestamp_ms = Some(sample.timestamp_ms);

        match event.phase {
            PenPhase::Down => self.pen_down(sample),
            PenPhase::Move => self.pen_move(sample),
            PenPhase::Up => self.pen_up(sample),
        }
    }

    fn pen_down(&mut self, sample: Sample) -> SegmentOutcome {
        match self.state {
            SegmenterState::Collecting => {
                // Missing pen-up: close the current stroke where it ended.
                debug!(stroke_id = %self.candidate_id, "pen down while collecting, closing stroke");
                let end_ms = self
                    .candidate
                    .last()
                    .map_or(sample.timestamp_ms, |s| s.timestamp_ms);
                self.lift(end_ms);
                self.pending = None;
            }
            SegmenterState::Lifted => {
                let last_up = self.last_pen_up_ms.unwrap_or(0);
                let gap_ms = sample.timestamp_ms.saturating_sub(last_up);

                if gap_ms <= self.error_window_ms {
                    // Pen flicker: resume the lifted stroke if its commit
                    // has not fired yet.
                    if self.pending.take().is_some_and(|handle| handle.cancel()) {
                        self.candidate.push(sample);
                        self.accumulate_distance(&sample);
                        self.state = SegmenterState::Collecting;
                        debug!(stroke_id = %self.candidate_id, gap_ms, "pen flicker merged");
                        return SegmentOutcome::Merged {
                            stroke_id: self.candidate_id,
                            gap_ms,
                        };
                    }
                    debug!(
                        stroke_id = %self.candidate_id,
                        gap_ms,
                        "flicker detected after commit fired, starting new stroke"
                    );
                } else {
                    // Release the pending commit; it fires on its own.
                    trace!(gap_ms, "pen down after error window");
                    self.pending = None;
                }
            }
            SegmenterState::Idle => {}
        }

        self.start_stroke(sample)
    }

    fn pen_move(&mut self, sample: Sample) -> SegmentOutcome {
        if self.state != SegmenterState::Collecting {
            trace!(state = ?self.state, "ignoring move without pen down");
            return SegmentOutcome::Ignored(IgnoreReason::NotCollecting(PenPhase::Move));
        }

        self.candidate.push(sample);
        self.accumulate_distance(&sample);
        let stroke_id = self.candidate_id;

        let Some(threshold) = self.preview_distance else {
            return SegmentOutcome::Appended { stroke_id };
        };
        if self.distance <= threshold {
            return SegmentOutcome::Appended { stroke_id };
        }

        self.distance = 0.0;
        self.preview_id = Some(stroke_id);
        self.store
            .set_preview(Stroke::new(stroke_id, self.candidate.as_slice()));
        SegmentOutcome::PreviewPublished { stroke_id }
    }

    fn pen_up(&mut self, sample: Sample) -> SegmentOutcome {
        if self.state != SegmenterState::Collecting {
            trace!(state = ?self.state, "ignoring pen up without pen down");
            return SegmentOutcome::Ignored(IgnoreReason::NotCollecting(PenPhase::Up));
        }

        self.lift(sample.timestamp_ms);
        SegmentOutcome::Lifted {
            stroke_id: self.candidate_id,
        }
    }

    /// Hand an immutable copy of the candidate to the scheduler.
    fn lift(&mut self, up_ms: u64) {
        self.last_pen_up_ms = Some(up_ms);
        let stroke = Stroke::new(self.candidate_id, self.candidate.as_slice());
        debug!(stroke_id = %stroke.id, samples = stroke.len(), "pen up, scheduling commit");
        self.pending = Some(self.scheduler.schedule(stroke, self.preview_id));
        self.state = SegmenterState::Lifted;
    }

    fn start_stroke(&mut self, sample: Sample) -> SegmentOutcome {
        let stroke_id = StrokeId(self.next_id);
        self.next_id += 1;

        self.candidate_id = stroke_id;
        self.candidate = vec![sample];
        self.distance = 0.0;
        self.anchor = Some(sample);
        self.preview_id = None;
        self.state = SegmenterState::Collecting;

        debug!(%stroke_id, t = sample.timestamp_ms, "stroke started");
        SegmentOutcome::Started { stroke_id }
    }

    fn accumulate_distance(&mut self, sample: &Sample) {
        if let Some(anchor) = self.anchor {
            self.distance += anchor.distance_to(sample);
        }
        self.anchor = Some(*sample);
    }

    /// Change the preview threshold. `None` or a non-positive value turns
    /// previews off.
    ///
    /// Distance is measured afresh from the candidate's current end, so a
    /// threshold enabled mid-stroke only counts movement made after the call.
    pub fn set_preview_distance(&mut self, distance: Option<f64>) {
        self.preview_distance = distance.filter(|d| d.is_finite() && *d > 0.0);
        self.distance = 0.0;
    }

    pub fn preview_distance(&self) -> Option<f64> {
        self.preview_distance
    }

    /// Drop any stroke in progress and cancel its pending commit.
    pub fn reset(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.cancel();
        }
        self.state = SegmenterState::Idle;
        self.candidate.clear();
        self.last_pen_up_ms = None;
        self.last_timestamp_ms = None;
        self.distance = 0.0;
        self.anchor = None;
        self.preview_id = None;
    }

    pub fn state(&self) -> SegmenterState {
        self.state
    }

    /// Timestamp of the most recent pen-up
    pub fn last_pen_up_time(&self) -> Option<u64> {
        self.last_pen_up_ms
    }

    /// Samples in the candidate stroke (including a lifted one)
    pub fn candidate_len(&self) -> usize {
        self.candidate.len()
    }

    /// Commit waiting on the current candidate, if any
    pub fn pending_commit(&self) -> Option<&CommitHandle> {
        self.pending.as_ref()
    }
}
