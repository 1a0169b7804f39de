//! Media surfaces: the platform objects that actually play media.
//!
//! A surface owns the playback state. Widgets issue commands on it and learn
//! about the outcome only through the notifications it delivers.

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
mod simulated;

use egui::{Context, TextureId};
use std::sync::Arc;

use crate::events::{ListenerId, ListenerRegistry};

pub use simulated::SimulatedSurface;

/// Notifications a media surface emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    TimeUpdate,
    LoadedMetadata,
    Play,
    Pause,
    VolumeChange,
}

/// Callback invoked with the surface that fired the notification.
pub type MediaListener = Arc<dyn Fn(&dyn MediaSurface) + Send + Sync>;

/// A playable media element.
///
/// Commands are fire-and-forget: their effect is reported later through
/// notifications delivered from [`update`](Self::update), never from inside
/// the command itself.
pub trait MediaSurface {
    /// Bind the surface to a media resource, resetting playback.
    fn set_src(&self, src: &str);
    fn src(&self) -> String;

    fn play(&self);
    fn pause(&self);
    fn paused(&self) -> bool;

    fn muted(&self) -> bool;
    fn set_muted(&self, muted: bool);
    /// Volume in `0.0..=1.0`.
    fn volume(&self) -> f32;

    /// Playback position in seconds.
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    /// Duration in seconds, 0 while unknown.
    fn duration(&self) -> f64;

    fn add_listener(&self, event: MediaEvent, listener: MediaListener) -> ListenerId;
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Platform tick, called once per frame. Delivers queued notifications.
    fn update(&self, ctx: &Context);

    /// Texture holding the most recent frame, if any frame has been shown.
    fn texture(&self) -> Option<TextureId> {
        None
    }

    /// Intrinsic video dimensions, once known.
    fn video_size(&self) -> Option<(u32, u32)> {
        None
    }
}

/// Deliver every queued notification of `registry` to its listeners.
pub(crate) fn deliver_pending(
    surface: &dyn MediaSurface,
    registry: &ListenerRegistry<MediaEvent, MediaListener>,
) {
    for event in registry.drain_pending() {
        for listener in registry.listeners(event) {
            listener(surface);
        }
    }
}
