//! Listener registry with off-thread dispatch.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use super::events::ContentChange;

type Callback = Arc<dyn Fn(ContentChange) + Send + Sync>;

/// Handle returned by [`ListenerRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registered {
    id: ListenerId,
    callback: Callback,
}

type Listeners = Arc<RwLock<Vec<Registered>>>;

/// Fan-out of [`ContentChange`] notifications to any number of listeners.
///
/// Notifications are queued and delivered from a dedicated dispatcher
/// thread, so a slow listener delays other listeners but never the writer
/// that raised the change. A listener that panics is unsubscribed.
///
/// The dispatcher thread exits once the registry is dropped. A listener that
/// owns whatever owns the registry (typically the store) keeps both alive
/// until it is unsubscribed; [`InkEngine`](crate::InkEngine) does that on
/// drop.
pub struct ListenerRegistry {
    listeners: Listeners,
    next_id: AtomicU64,
    tx: Sender<ContentChange>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

impl ListenerRegistry {
    /// Create a registry and start its dispatcher thread.
    pub fn new() -> std::io::Result<Self> {
        let listeners: Listeners = Arc::new(RwLock::new(Vec::new()));
        let (tx, rx) = mpsc::channel();

        let dispatch_listeners = Arc::clone(&listeners);
        std::thread::Builder::new()
            .name("ink-listeners".into())
            .spawn(move || dispatch(dispatch_listeners, rx))?;

        Ok(Self {
            listeners,
            next_id: AtomicU64::new(0),
            tx,
        })
    }

    /// Register a listener. It is invoked once per change, in change order.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(ContentChange) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registered {
                id,
                callback: Arc::new(listener),
            });
        id
    }

    /// Remove one listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Remove every listener.
    pub fn unsubscribe_all(&self) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Queue a change for delivery. Never blocks.
    pub(crate) fn notify(&self, change: ContentChange) {
        if self.tx.send(change).is_err() {
            debug!(?change, "listener dispatcher stopped, dropping notification");
        }
    }
}

fn dispatch(listeners: Listeners, rx: Receiver<ContentChange>) {
    while let Ok(change) = rx.recv() {
        deliver(&listeners, change);
    }
    debug!("listener dispatcher exiting");
}

fn deliver(listeners: &Listeners, change: ContentChange) {
    // Snapshot so callbacks run without the lock held; a callback may
    // subscribe or unsubscribe.
    let snapshot: Vec<(ListenerId, Callback)> = listeners
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(|l| (l.id, Arc::clone(&l.callback)))
        .collect();

    let mut faulted = Vec::new();
    for (id, callback) in snapshot {
        if catch_unwind(AssertUnwindSafe(|| callback(change))).is_err() {
            warn!(listener = id.0, ?change, "listener panicked, unsubscribing it");
            faulted.push(id);
        }
    }

    if !faulted.is_empty() {
        listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|l| !faulted.contains(&l.id));
    }
}
