//! Change notifications fanned out to store listeners.

use crate::types::StrokeId;

/// What changed in the store.
///
/// Listeners are expected to re-query the store rather than rely on the
/// payload; the tag only says which kind of change triggered the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentChange {
    /// A stroke was appended to the committed collection.
    Committed { stroke_id: StrokeId },
    /// The preview slot now holds an in-progress stroke.
    PreviewUpdated { stroke_id: StrokeId },
    /// The preview slot was emptied without a commit.
    PreviewCleared,
    /// All strokes were removed.
    Cleared,
}
