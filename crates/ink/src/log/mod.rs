//! Stroke storage and change notification for the ink engine.
//!
//! This module provides:
//! - [`StrokeStore`] - Thread-safe ordered storage for committed strokes,
//!   the preview slot and the incremental retrieval cursor
//! - [`ContentChange`] - Notification tags delivered to listeners
//! - [`ListenerRegistry`] - Listener fan-out with off-thread dispatch
//!
//! ## Retrieval
//!
//! Consumers either re-read everything with [`StrokeStore::all`], or consume
//! new strokes once with [`StrokeStore::poll_new`]:
//!
//! ```text
//! committed: [s0, s1, s2, s3]
//!                     ^ cursor = 2
//! poll_new() -> [s2, s3], cursor = 4
//! poll_new() -> []
//! ```
//!
//! Previews never appear in either; they live in a single replaceable slot
//! read with [`StrokeStore::preview`].

mod events;
mod listeners;
mod storage;

pub use events::ContentChange;
pub use listeners::{ListenerId, ListenerRegistry};
pub use storage::StrokeStore;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sample, Stroke, StrokeId};
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::time::Duration;

    fn stroke(id: u64, times: &[u64]) -> Stroke {
        let samples: Vec<Sample> = times
            .iter()
            .map(|&t| Sample::new(t as f64, 0.0, 128, t))
            .collect();
        Stroke::new(StrokeId(id), samples)
    }

    fn ids(strokes: &[Stroke]) -> Vec<u64> {
        strokes.iter().map(|s| s.id.0).collect()
    }

    #[test]
    fn test_commit_and_all() {
        let store = StrokeStore::new().unwrap();
        assert!(store.is_empty());

        store.commit(stroke(1, &[0, 10]));
        store.commit(stroke(2, &[40, 50]));

        assert_eq!(store.stroke_count(), 2);
        assert_eq!(ids(&store.all()), vec![1, 2]);
        assert_eq!(store.last_stroke_end_time(), Some(50));
    }

    #[test]
    fn test_last_stroke_end_time_empty() {
        let store = StrokeStore::new().unwrap();
        assert_eq!(store.last_stroke_end_time(), None);
    }

    #[test]
    fn test_poll_new_consumes_once() {
        let store = StrokeStore::new().unwrap();
        store.commit(stroke(1, &[0]));
        store.commit(stroke(2, &[5]));

        assert_eq!(ids(&store.poll_new()), vec![1, 2]);
        assert!(store.poll_new().is_empty());

        store.commit(stroke(3, &[9]));
        assert_eq!(ids(&store.poll_new()), vec![3]);

        // all() is unaffected by polling
        assert_eq!(ids(&store.all()), vec![1, 2, 3]);
        assert_eq!(ids(&store.all()), vec![1, 2, 3]);
    }

    #[test]
    fn test_preview_slot() {
        let store = StrokeStore::new().unwrap();
        store.set_preview(stroke(1, &[0]));
        store.set_preview(stroke(1, &[0, 5]));

        let preview = store.preview().unwrap();
        assert_eq!(preview.len(), 2);
        // Previews are not committed strokes
        assert!(store.all().is_empty());
        assert_eq!(store.stroke_count(), 0);

        store.clear_preview();
        assert!(store.preview().is_none());
    }

    #[test]
    fn test_scheduled_commit_replaces_own_preview() {
        let store = StrokeStore::new().unwrap();
        store.set_preview(stroke(1, &[0]));

        assert!(store.commit_scheduled(stroke(1, &[0, 10]), Some(StrokeId(1)), store.generation()));
        assert!(store.preview().is_none());
        assert_eq!(store.stroke_count(), 1);
    }

    #[test]
    fn test_scheduled_commit_keeps_newer_preview() {
        let store = StrokeStore::new().unwrap();
        store.set_preview(stroke(2, &[40]));

        assert!(store.commit_scheduled(stroke(1, &[0, 10]), Some(StrokeId(1)), store.generation()));
        assert_eq!(store.preview().map(|p| p.id), Some(StrokeId(2)));
    }

    #[test]
    fn test_clear_resets_everything() {
        let store = StrokeStore::new().unwrap();
        store.commit(stroke(1, &[0]));
        store.commit(stroke(2, &[5]));
        store.poll_new();
        store.set_preview(stroke(3, &[9]));

        store.clear();

        assert_eq!(store.stroke_count(), 0);
        assert!(store.all().is_empty());
        assert!(store.preview().is_none());
        assert!(store.poll_new().is_empty());

        store.commit(stroke(4, &[20]));
        assert_eq!(ids(&store.poll_new()), vec![4]);
    }

    #[test]
    fn test_commit_from_before_clear_is_discarded() {
        let store = StrokeStore::new().unwrap();
        let generation = store.generation();
        store.clear();

        assert!(!store.commit_scheduled(stroke(1, &[0]), None, generation));
        assert!(store.is_empty());
    }

    #[test]
    fn test_display() {
        let store = StrokeStore::new().unwrap();
        store.commit(stroke(1, &[0]));
        assert_eq!(store.to_string(), "StrokeStore [1 strokes]");
    }

    #[test]
    fn test_store_notifies_listeners() {
        let store = StrokeStore::new().unwrap();
        let (tx, rx) = mpsc::channel();
        store.subscribe(move |change| {
            let _ = tx.send(change);
        });

        store.set_preview(stroke(1, &[0]));
        store.commit(stroke(1, &[0, 10]));
        store.clear_preview();
        store.clear();

        let timeout = Duration::from_secs(5);
        let received: Vec<_> = (0..4).map(|_| rx.recv_timeout(timeout).unwrap()).collect();
        assert_eq!(
            received,
            vec![
                ContentChange::PreviewUpdated {
                    stroke_id: StrokeId(1)
                },
                ContentChange::Committed {
                    stroke_id: StrokeId(1)
                },
                // a plain commit leaves the preview slot alone
                ContentChange::PreviewCleared,
                ContentChange::Cleared,
            ]
        );
    }

    #[test]
    fn test_clear_preview_on_empty_slot_is_silent() {
        let store = StrokeStore::new().unwrap();
        let (tx, rx) = mpsc::channel();
        store.subscribe(move |change| {
            let _ = tx.send(change);
        });

        store.clear_preview();
        store.clear();

        let timeout = Duration::from_secs(5);
        assert_eq!(rx.recv_timeout(timeout).unwrap(), ContentChange::Cleared);
    }

    #[test]
    fn test_store_concurrent_readers() {
        let store = Arc::new(StrokeStore::new().unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..200 {
                        let all = store.all();
                        // Snapshots only ever grow and stay ordered
                        assert!(all.len() >= last);
                        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
                        last = all.len();
                    }
                })
            })
            .collect();

        for id in 1..=100 {
            store.commit(stroke(id, &[id]));
        }
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.stroke_count(), 100);
    }
}
