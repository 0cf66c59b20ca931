//! Thread-safe ordered storage for committed and preview strokes.

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace};

use crate::snapshot::InkSnapshot;
use crate::types::{Stroke, StrokeId};

use super::events::ContentChange;
use super::listeners::{ListenerId, ListenerRegistry};

#[derive(Debug, Default)]
struct StoreState {
    committed: Vec<Stroke>,
    preview: Option<Stroke>,
    /// Committed strokes already handed out by `poll_new`
    cursor: usize,
    /// Bumped on every clear; commits scheduled before a clear are stale.
    generation: u64,
}

/// Single source of truth for committed strokes and the preview slot.
///
/// Designed for one writer (the ingest path and its commit worker) and any
/// number of reader threads. Every operation takes the lock briefly and
/// readers get cloned strokes, never the backing collection. Change
/// notifications are raised after the lock is released.
pub struct StrokeStore {
    state: RwLock<StoreState>,
    listeners: ListenerRegistry,
}

impl fmt::Debug for StrokeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("StrokeStore")
            .field("stroke_count", &state.committed.len())
            .field("has_preview", &state.preview.is_some())
            .field("cursor", &state.cursor)
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl fmt::Display for StrokeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StrokeStore [{} strokes]", self.stroke_count())
    }
}

impl StrokeStore {
    /// Create an empty store with its own listener registry.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self::with_listeners(ListenerRegistry::new()?))
    }

    pub fn with_listeners(listeners: ListenerRegistry) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            listeners,
        }
    }

    // The store has no invariant a panicking holder can break halfway, so a
    // poisoned lock is recovered rather than propagated.
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a stroke to the committed collection.
    pub fn commit(&self, stroke: Stroke) {
        let stroke_id = stroke.id;
        self.write().committed.push(stroke);
        debug!(%stroke_id, "stroke committed");
        self.listeners.notify(ContentChange::Committed { stroke_id });
    }

    /// Commit on behalf of a delayed commit scheduled in `generation`.
    ///
    /// Removes the preview slot if it still holds a preview of `preview_id`
    /// and appends the stroke, as one step. Returns false (and drops the
    /// stroke) if the store was cleared since the commit was scheduled.
    pub(crate) fn commit_scheduled(
        &self,
        stroke: Stroke,
        preview_id: Option<StrokeId>,
        generation: u64,
    ) -> bool {
        let stroke_id = stroke.id;
        {
            let mut state = self.write();
            if state.generation != generation {
                debug!(%stroke_id, "discarding commit scheduled before clear");
                return false;
            }
            if preview_id.is_some() && state.preview.as_ref().map(|p| p.id) == preview_id {
                state.preview = None;
            }
            state.committed.push(stroke);
        }
        debug!(%stroke_id, "stroke committed");
        self.listeners.notify(ContentChange::Committed { stroke_id });
        true
    }

    /// Replace the preview slot.
    pub fn set_preview(&self, stroke: Stroke) {
        let stroke_id = stroke.id;
        self.write().preview = Some(stroke);
        trace!(%stroke_id, "preview updated");
        self.listeners.notify(ContentChange::PreviewUpdated { stroke_id });
    }

    /// Empty the preview slot. No notification if it was already empty.
    pub fn clear_preview(&self) {
        if self.write().preview.take().is_some() {
            self.listeners.notify(ContentChange::PreviewCleared);
        }
    }

    /// Current preview stroke, if any
    pub fn preview(&self) -> Option<Stroke> {
        self.read().preview.clone()
    }

    /// All committed strokes in commit order. Does not move the cursor.
    pub fn all(&self) -> Vec<Stroke> {
        self.read().committed.clone()
    }

    /// Committed strokes not yet returned by a previous call.
    ///
    /// Advances the cursor to the current stroke count, so a second call with
    /// no commits in between returns nothing.
    pub fn poll_new(&self) -> Vec<Stroke> {
        let mut state = self.write();
        let start = state.cursor.min(state.committed.len());
        let fresh = state.committed[start..].to_vec();
        state.cursor = state.committed.len();
        fresh
    }

    pub fn stroke_count(&self) -> usize {
        self.read().committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().committed.is_empty()
    }

    /// End timestamp of the most recently committed stroke
    pub fn last_stroke_end_time(&self) -> Option<u64> {
        self.read()
            .committed
            .last()
            .and_then(|stroke| stroke.last_timestamp())
    }

    /// Remove all strokes and the preview, and reset the cursor.
    pub fn clear(&self) {
        {
            let mut state = self.write();
            let generation = state.generation.wrapping_add(1);
            *state = StoreState {
                generation,
                ..StoreState::default()
            };
        }
        debug!("stroke store cleared");
        self.listeners.notify(ContentChange::Cleared);
    }

    /// Copy of the committed strokes for an external persistence layer.
    pub fn export_snapshot(&self) -> InkSnapshot {
        InkSnapshot::new(self.all())
    }

    pub(crate) fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Register a change listener. See [`ListenerRegistry`].
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(ContentChange) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn unsubscribe_all(&self) {
        self.listeners.unsubscribe_all();
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }
}
