//! Fullscreen promotion of presentation containers.
//!
//! [`FullscreenHost`] plays the role of the document: it knows which
//! presentation, if any, currently fills the window and tells every listener
//! when that changes. Requests are asynchronous. A granted request only marks
//! its target as pending until the platform reports the real window state
//! through [`FullscreenHost::confirm`].

use egui::{Context, ViewportCommand};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::events::{ListenerId, ListenerRegistry};

static NEXT_PRESENTATION: AtomicU64 = AtomicU64::new(1);

/// Identity of one presentation container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PresentationId(u64);

/// The region promoted to fullscreen: the video together with its controls.
#[derive(Debug, PartialEq, Eq)]
pub struct PresentationSurface {
    id: PresentationId,
}

impl PresentationSurface {
    /// Allocate a container with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: PresentationId(NEXT_PRESENTATION.fetch_add(1, Ordering::Relaxed)),
        }
    }

    pub fn id(&self) -> PresentationId {
        self.id
    }
}

impl Default for PresentationSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenError {
    #[error("fullscreen request was not allowed by the platform")]
    NotAllowed,
    #[error("nothing is fullscreen")]
    NotFullscreen,
}

/// Window-level switch behind a [`FullscreenHost`].
pub trait FullscreenDisplay {
    fn set_fullscreen(&self, fullscreen: bool) -> Result<(), FullscreenError>;
}

/// Drives the egui viewport.
pub struct EguiDisplay {
    ctx: Context,
}

impl EguiDisplay {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

impl FullscreenDisplay for EguiDisplay {
    fn set_fullscreen(&self, fullscreen: bool) -> Result<(), FullscreenError> {
        self.ctx
            .send_viewport_cmd(ViewportCommand::Fullscreen(fullscreen));
        Ok(())
    }
}

/// Display without a window. Either grants every request or rejects entering
/// fullscreen, the way a browser does without user activation.
pub struct HeadlessDisplay {
    allow: AtomicBool,
}

impl HeadlessDisplay {
    pub fn granting() -> Self {
        Self {
            allow: AtomicBool::new(true),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            allow: AtomicBool::new(false),
        }
    }

    pub fn set_allowed(&self, allow: bool) {
        self.allow.store(allow, Ordering::Relaxed);
    }
}

impl FullscreenDisplay for HeadlessDisplay {
    fn set_fullscreen(&self, fullscreen: bool) -> Result<(), FullscreenError> {
        if fullscreen && !self.allow.load(Ordering::Relaxed) {
            return Err(FullscreenError::NotAllowed);
        }
        Ok(())
    }
}

impl<D: FullscreenDisplay + ?Sized> FullscreenDisplay for Arc<D> {
    fn set_fullscreen(&self, fullscreen: bool) -> Result<(), FullscreenError> {
        (**self).set_fullscreen(fullscreen)
    }
}

/// Notifications a [`FullscreenHost`] emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FullscreenEvent {
    Change,
}

pub type FullscreenListener = Arc<dyn Fn(&FullscreenHost) + Send + Sync>;

#[derive(Default)]
struct Promotion {
    element: Option<PresentationId>,
    pending: Option<PresentationId>,
}

pub struct FullscreenHost {
    display: Box<dyn FullscreenDisplay>,
    promotion: Mutex<Promotion>,
    listeners: ListenerRegistry<FullscreenEvent, FullscreenListener>,
}

impl FullscreenHost {
    pub fn new(display: impl FullscreenDisplay + 'static) -> Self {
        Self {
            display: Box::new(display),
            promotion: Mutex::new(Promotion::default()),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Host backed by a [`HeadlessDisplay`] that grants every request.
    pub fn headless() -> Self {
        Self::new(HeadlessDisplay::granting())
    }

    /// The presentation currently filling the window.
    pub fn fullscreen_element(&self) -> Option<PresentationId> {
        self.promotion.lock().element
    }

    /// Ask for `target` to become fullscreen. Success only means the request
    /// was accepted; the change itself is announced by a notification.
    pub fn request_fullscreen(&self, target: PresentationId) -> Result<(), FullscreenError> {
        if self.fullscreen_element() == Some(target) {
            return Ok(());
        }
        self.display.set_fullscreen(true)?;
        self.promotion.lock().pending = Some(target);
        log::debug!("fullscreen requested for {target:?}");
        Ok(())
    }

    pub fn exit_fullscreen(&self) -> Result<(), FullscreenError> {
        {
            let promotion = self.promotion.lock();
            if promotion.element.is_none() && promotion.pending.is_none() {
                return Err(FullscreenError::NotFullscreen);
            }
        }
        self.display.set_fullscreen(false)?;
        self.promotion.lock().pending = None;
        Ok(())
    }

    /// Report the window's actual fullscreen state. Listeners are notified
    /// only when the fullscreen element changes.
    pub fn confirm(&self, fullscreen: bool) {
        let changed = {
            let mut promotion = self.promotion.lock();
            let element = if fullscreen {
                promotion.pending.take().or(promotion.element)
            } else {
                None
            };
            let changed = element != promotion.element;
            promotion.element = element;
            changed
        };
        if changed {
            log::debug!("fullscreen element is now {:?}", self.fullscreen_element());
            for listener in self.listeners.listeners(FullscreenEvent::Change) {
                listener(self);
            }
        }
    }

    pub fn add_change_listener(&self, listener: FullscreenListener) -> ListenerId {
        self.listeners.add(FullscreenEvent::Change, listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Snapshot of the change listeners.
    pub fn listeners(&self) -> Vec<FullscreenListener> {
        self.listeners.listeners(FullscreenEvent::Change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn change_counter(host: &FullscreenHost) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        host.add_change_listener(Arc::new(move |_: &FullscreenHost| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        count
    }

    #[test]
    fn presentations_have_distinct_identities() {
        assert_ne!(PresentationSurface::new().id(), PresentationSurface::new().id());
    }

    #[test]
    fn granted_request_waits_for_confirmation() {
        let host = FullscreenHost::headless();
        let changes = change_counter(&host);
        let target = PresentationSurface::new();

        host.request_fullscreen(target.id()).unwrap();
        assert_eq!(host.fullscreen_element(), None);
        assert_eq!(changes.load(Ordering::SeqCst), 0);

        host.confirm(true);
        assert_eq!(host.fullscreen_element(), Some(target.id()));
        assert_eq!(changes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn repeated_confirmation_does_not_renotify() {
        let host = FullscreenHost::headless();
        let changes = change_counter(&host);
        let target = PresentationSurface::new();

        host.request_fullscreen(target.id()).unwrap();
        host.confirm(true);
        host.confirm(true);
        host.confirm(false);
        host.confirm(false);

        assert_eq!(changes.load(Ordering::SeqCst), 2);
        assert_eq!(host.fullscreen_element(), None);
    }

    #[test]
    fn pending_request_survives_frames_before_the_window_switches() {
        let host = FullscreenHost::headless();
        let target = PresentationSurface::new();

        host.request_fullscreen(target.id()).unwrap();
        host.confirm(false);
        host.confirm(true);

        assert_eq!(host.fullscreen_element(), Some(target.id()));
    }

    #[test]
    fn rejected_request_changes_nothing() {
        let host = FullscreenHost::new(HeadlessDisplay::rejecting());
        let changes = change_counter(&host);
        let target = PresentationSurface::new();

        assert_eq!(
            host.request_fullscreen(target.id()),
            Err(FullscreenError::NotAllowed)
        );
        host.confirm(true);

        assert_eq!(host.fullscreen_element(), None);
        assert_eq!(changes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn exit_without_fullscreen_is_an_error() {
        let host = FullscreenHost::headless();
        assert_eq!(host.exit_fullscreen(), Err(FullscreenError::NotFullscreen));
    }

    #[test]
    fn display_can_be_shared_through_an_arc() {
        let display = Arc::new(HeadlessDisplay::rejecting());
        let host = FullscreenHost::new(Arc::clone(&display));
        let target = PresentationSurface::new();

        assert!(host.request_fullscreen(target.id()).is_err());
        display.set_allowed(true);
        assert!(host.request_fullscreen(target.id()).is_ok());
    }
}
