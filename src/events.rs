use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned when a listener is registered; used to remove it again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

struct Entry<K, L> {
    id: ListenerId,
    kind: K,
    listener: L,
}

struct Inner<K, L> {
    entries: Vec<Entry<K, L>>,
    pending: VecDeque<K>,
}

/// Listener table plus a queue of notifications waiting for delivery.
///
/// The registry never calls listeners itself. Owners take a snapshot with
/// [`listeners`](Self::listeners) and invoke it after the lock is released, so a
/// listener is free to read back into the object that is notifying it.
pub struct ListenerRegistry<K, L> {
    inner: Mutex<Inner<K, L>>,
}

impl<K, L> Default for ListenerRegistry<K, L> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: Vec::new(),
                pending: VecDeque::new(),
            }),
        }
    }
}

impl<K, L> ListenerRegistry<K, L>
where
    K: Copy + PartialEq,
    L: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: K, listener: L) -> ListenerId {
        let id = ListenerId::next();
        self.inner.lock().entries.push(Entry { id, kind, listener });
        id
    }

    /// Remove a listener. Returns false if the id was not registered here.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|entry| entry.id != id);
        inner.entries.len() != before
    }

    /// Number of live registrations across all kinds.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the listeners for `kind`, in registration order.
    pub fn listeners(&self, kind: K) -> Vec<L> {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.listener.clone())
            .collect()
    }

    /// Queue a notification for later delivery.
    pub fn queue(&self, kind: K) {
        self.inner.lock().pending.push_back(kind);
    }

    /// Take every queued notification, oldest first.
    pub fn drain_pending(&self) -> Vec<K> {
        self.inner.lock().pending.drain(..).collect()
    }
}
