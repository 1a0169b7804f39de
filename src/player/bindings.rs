use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Liveness flag shared by every handler of one mount cycle.
#[derive(Clone)]
pub(crate) struct LiveToken(Arc<AtomicBool>);

impl LiveToken {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub(crate) fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One acquired listener registration, removed when dropped.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Every subscription taken for one mount cycle.
///
/// Built up one subscription at a time, so if setup stops part way the
/// registrations acquired so far are still released when this is dropped.
pub(crate) struct Bindings {
    live: LiveToken,
    subscriptions: Vec<Subscription>,
}

impl Bindings {
    pub(crate) fn new(live: LiveToken) -> Self {
        Self {
            live,
            subscriptions: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub(crate) fn len(&self) -> usize {
        self.subscriptions.len()
    }
}

impl Drop for Bindings {
    fn drop(&mut self) {
        self.live.revoke();
        // Release in reverse acquisition order.
        while let Some(subscription) = self.subscriptions.pop() {
            drop(subscription);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn dropping_bindings_releases_in_reverse_and_revokes() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let live = LiveToken::new();
        let mut bindings = Bindings::new(live.clone());
        for tag in ["first", "second", "third"] {
            let released = Rc::clone(&released);
            bindings.push(Subscription::new(move || released.borrow_mut().push(tag)));
        }
        assert_eq!(bindings.len(), 3);

        drop(bindings);

        assert!(!live.is_live());
        assert_eq!(*released.borrow(), vec!["third", "second", "first"]);
    }

    #[test]
    fn partial_setup_is_released_on_unwind() {
        let released = Rc::new(RefCell::new(0));
        let counted = Rc::clone(&released);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let mut bindings = Bindings::new(LiveToken::new());
            bindings.push(Subscription::new(move || *counted.borrow_mut() += 1));
            panic!("setup failed");
        }));

        assert!(outcome.is_err());
        assert_eq!(*released.borrow(), 1);
    }
}
