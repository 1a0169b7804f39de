use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Bounded sample queue between the decoder and the audio callback.
/// Pushing never blocks; the oldest samples are dropped when full.
pub struct SampleRing<T> {
    inner: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T: Copy> SampleRing<T> {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        })
    }

    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        let mut ring = self.inner.lock();
        for item in items {
            if ring.len() >= self.capacity {
                ring.pop_front();
            }
            ring.push_back(item);
        }
    }

    pub fn pop(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrites_oldest_when_full() {
        let ring = SampleRing::new(3);
        ring.extend([1, 2, 3, 4, 5]);
        assert_eq!(ring.pop(), Some(3));
        assert_eq!(ring.pop(), Some(4));
        assert_eq!(ring.pop(), Some(5));
        assert_eq!(ring.pop(), None);
    }
}
