//! Delayed, cancellable commit of lifted strokes

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::log::StrokeStore;
use crate::types::{Stroke, StrokeId};

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Where a scheduled commit stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    Pending,
    Fired,
    Cancelled,
}

/// Handle to one scheduled commit.
///
/// The state moves from `Pending` to either `Fired` or `Cancelled` exactly
/// once; whichever of [`cancel`](Self::cancel) and the commit worker gets
/// there first wins, and the loser sees a no-op.
#[derive(Debug, Clone)]
pub struct CommitHandle {
    stroke_id: StrokeId,
    state: Arc<AtomicU8>,
}

impl CommitHandle {
    fn new(stroke_id: StrokeId) -> Self {
        Self {
            stroke_id,
            state: Arc::new(AtomicU8::new(PENDING)),
        }
    }

    /// Request that the commit not happen.
    ///
    /// Returns true if the commit was suppressed, false if it already fired
    /// (or was already cancelled).
    pub fn cancel(&self) -> bool {
        self.transition(CANCELLED)
    }

    fn try_fire(&self) -> bool {
        self.transition(FIRED)
    }

    fn transition(&self, to: u8) -> bool {
        self.state
            .compare_exchange(PENDING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn status(&self) -> CommitStatus {
        match self.state.load(Ordering::Acquire) {
            PENDING => CommitStatus::Pending,
            FIRED => CommitStatus::Fired,
            _ => CommitStatus::Cancelled,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status() == CommitStatus::Pending
    }

    pub fn stroke_id(&self) -> StrokeId {
        self.stroke_id
    }
}

struct PendingCommit {
    handle: CommitHandle,
    deadline: Instant,
    stroke: Stroke,
    preview_id: Option<StrokeId>,
    generation: u64,
}

impl PendingCommit {
    /// Commit unless cancelled. Returns whether the stroke landed.
    fn fire(self, store: &StrokeStore) -> bool {
        if !self.handle.try_fire() {
            debug!(stroke_id = %self.stroke.id, "delayed commit cancelled");
            return false;
        }
        store.commit_scheduled(self.stroke, self.preview_id, self.generation)
    }
}

/// Commits lifted strokes after a fixed delay unless cancelled first.
///
/// A single worker task processes scheduled commits in FIFO order. Every
/// deadline is `schedule time + delay`, so FIFO order is deadline order and
/// strokes land in the store in the order their pen-ups arrived.
pub struct DelayedCommitScheduler {
    delay: Duration,
    store: Arc<StrokeStore>,
    tx: UnboundedSender<PendingCommit>,
}

impl std::fmt::Debug for DelayedCommitScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayedCommitScheduler")
            .field("delay", &self.delay)
            .field("worker_running", &!self.tx.is_closed())
            .finish()
    }
}

impl DelayedCommitScheduler {
    /// Start the commit worker on `runtime`.
    pub fn new(store: Arc<StrokeStore>, delay: Duration, runtime: &Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_worker(Arc::clone(&store), rx));
        Self { delay, store, tx }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `stroke` for commit after the delay.
    ///
    /// `preview_id` names the preview published for this stroke, if any; it
    /// is removed from the store in the same step as the commit.
    pub fn schedule(&self, stroke: Stroke, preview_id: Option<StrokeId>) -> CommitHandle {
        let handle = CommitHandle::new(stroke.id);
        let job = PendingCommit {
            handle: handle.clone(),
            deadline: Instant::now() + self.delay,
            stroke,
            preview_id,
            generation: self.store.generation(),
        };
        trace!(stroke_id = %handle.stroke_id(), delay = ?self.delay, "commit scheduled");

        if let Err(mpsc::error::SendError(job)) = self.tx.send(job) {
            // Worker gone (runtime shut down); commit now rather than lose ink.
            warn!(stroke_id = %handle.stroke_id(), "commit worker stopped, committing immediately");
            job.fire(&self.store);
        }
        handle
    }
}

async fn run_worker(store: Arc<StrokeStore>, mut rx: UnboundedReceiver<PendingCommit>) {
    while let Some(job) = rx.recv().await {
        tokio::time::sleep_until(job.deadline).await;
        job.fire(&store);
    }
    debug!("commit worker exiting");
}
