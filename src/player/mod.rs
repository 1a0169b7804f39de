//! The media player widget state.
//!
//! [`MediaPlayer`] turns user intents into commands on a [`MediaSurface`] and
//! [`FullscreenHost`], and rebuilds its [`ViewState`] from their notifications.

mod bindings;
mod state;

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use crate::events::ListenerId;
use crate::fullscreen::{FullscreenHost, PresentationSurface};
use crate::surface::{MediaEvent, MediaListener, MediaSurface};
use bindings::{Bindings, LiveToken};

pub use bindings::Subscription;
pub use state::ViewState;

/// Externally supplied configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerProps {
    /// Locator of the media resource.
    pub src: String,
    /// Locator of the preview image shown until a frame is available.
    pub poster: Option<String>,
}

impl PlayerProps {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            poster: None,
        }
    }

    pub fn with_poster(mut self, poster: impl Into<String>) -> Self {
        self.poster = Some(poster.into());
        self
    }
}

struct Mounted {
    media: Arc<dyn MediaSurface>,
    host: Arc<FullscreenHost>,
    _bindings: Bindings,
}

pub struct MediaPlayer {
    props: PlayerProps,
    presentation: PresentationSurface,
    state: Arc<Mutex<ViewState>>,
    mounted: Option<Mounted>,
}

impl MediaPlayer {
    /// Create an unmounted player. Commands are ignored until [`mount`](Self::mount).
    pub fn new(props: PlayerProps) -> Self {
        Self {
            props,
            presentation: PresentationSurface::new(),
            state: Arc::new(Mutex::new(ViewState::default())),
            mounted: None,
        }
    }

    /// Bind to a media surface and fullscreen host.
    ///
    /// Resets the view state, subscribes to every notification the player
    /// reconciles from, then points the surface at `props.src` and seeds the
    /// play and mute flags from the surface. Mounting an
    /// already mounted player unmounts it first.
    pub fn mount(&mut self, media: Arc<dyn MediaSurface>, host: Arc<FullscreenHost>) {
        self.unmount();
        *self.state.lock() = ViewState::default();

        let bindings = self.bind(&media, &host);
        log::debug!(
            "mounted player {:?} on {:?} with {} listeners",
            self.presentation.id(),
            self.props.src,
            bindings.len()
        );
        media.set_src(&self.props.src);
        // A reused surface keeps its audio settings across sources.
        {
            let mut state = self.state.lock();
            state.is_muted = media.muted() || media.volume() == 0.0;
            state.is_playing = !media.paused();
        }

        self.mounted = Some(Mounted {
            media,
            host,
            _bindings: bindings,
        });
    }

    /// Release every listener and detach from the surfaces. The view state
    /// keeps its last value.
    pub fn unmount(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            drop(mounted);
            log::debug!("unmounted player {:?}", self.presentation.id());
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn view_state(&self) -> ViewState {
        *self.state.lock()
    }

    pub fn props(&self) -> &PlayerProps {
        &self.props
    }

    pub fn presentation(&self) -> &PresentationSurface {
        &self.presentation
    }

    /// The bound media surface, while mounted.
    pub fn media(&self) -> Option<&Arc<dyn MediaSurface>> {
        self.mounted.as_ref().map(|mounted| &mounted.media)
    }

    /// Play if paused, pause otherwise. `is_playing` is set optimistically and
    /// corrected by the surface's own play/pause notifications.
    pub fn toggle_play_pause(&self) {
        let Some(mounted) = &self.mounted else {
            log::trace!("toggle_play_pause ignored: player not mounted");
            return;
        };
        let playing = if mounted.media.paused() {
            mounted.media.play();
            true
        } else {
            mounted.media.pause();
            false
        };
        self.state.lock().is_playing = playing;
    }

    pub fn toggle_mute(&self) {
        let Some(mounted) = &self.mounted else {
            log::trace!("toggle_mute ignored: player not mounted");
            return;
        };
        mounted.media.set_muted(!mounted.media.muted());
        let muted = mounted.media.muted();
        self.state.lock().is_muted = muted;
    }

    /// Request or leave fullscreen. `is_fullscreen` only changes when the
    /// host reports the change, so a rejected request leaves it untouched.
    pub fn toggle_fullscreen(&self) {
        let Some(mounted) = &self.mounted else {
            log::trace!("toggle_fullscreen ignored: player not mounted");
            return;
        };
        let result = if self.view_state().is_fullscreen {
            mounted.host.exit_fullscreen()
        } else {
            mounted.host.request_fullscreen(self.presentation.id())
        };
        if let Err(e) = result {
            log::warn!("fullscreen toggle failed: {}", e);
        }
    }

    /// Move playback to `seconds`. The caller keeps the target inside
    /// `0..=duration`; the seek bar does so by construction.
    pub fn seek(&self, seconds: f64) {
        let Some(mounted) = &self.mounted else {
            log::trace!("seek ignored: player not mounted");
            return;
        };
        mounted.media.set_current_time(seconds);
        self.state.lock().current_time = seconds;
    }

    fn bind(&self, media: &Arc<dyn MediaSurface>, host: &Arc<FullscreenHost>) -> Bindings {
        let live = LiveToken::new();
        let mut bindings = Bindings::new(live.clone());

        let reconcilers: [(MediaEvent, fn(&mut ViewState, &dyn MediaSurface)); 5] = [
            (MediaEvent::TimeUpdate, |state, media| {
                state.current_time = media.current_time();
            }),
            (MediaEvent::LoadedMetadata, |state, media| {
                let duration = media.duration();
                state.duration = if duration.is_finite() && duration > 0.0 {
                    duration
                } else {
                    0.0
                };
            }),
            (MediaEvent::Play, sync_playing),
            (MediaEvent::Pause, sync_playing),
            (MediaEvent::VolumeChange, |state, media| {
                state.is_muted = media.muted() || media.volume() == 0.0;
            }),
        ];
        for (event, apply) in reconcilers {
            let listener = media_listener(Arc::downgrade(&self.state), live.clone(), apply);
            let id = media.add_listener(event, listener);
            bindings.push(media_subscription(media, id));
        }

        let presentation = self.presentation.id();
        let state = Arc::downgrade(&self.state);
        let token = live;
        let id = host.add_change_listener(Arc::new(move |host: &FullscreenHost| {
            if !token.is_live() {
                return;
            }
            if let Some(state) = state.upgrade() {
                state.lock().is_fullscreen = host.fullscreen_element() == Some(presentation);
            }
        }));
        let host = Arc::clone(host);
        bindings.push(Subscription::new(move || {
            host.remove_listener(id);
        }));

        bindings
    }
}

impl Drop for MediaPlayer {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn sync_playing(state: &mut ViewState, media: &dyn MediaSurface) {
    state.is_playing = !media.paused();
}

fn media_listener(
    state: Weak<Mutex<ViewState>>,
    live: LiveToken,
    apply: fn(&mut ViewState, &dyn MediaSurface),
) -> MediaListener {
    Arc::new(move |media: &dyn MediaSurface| {
        if !live.is_live() {
            log::trace!("dropping notification delivered after unmount");
            return;
        }
        if let Some(state) = state.upgrade() {
            apply(&mut state.lock(), media);
        }
    })
}

fn media_subscription(media: &Arc<dyn MediaSurface>, id: ListenerId) -> Subscription {
    let media = Arc::clone(media);
    Subscription::new(move || {
        media.remove_listener(id);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SimulatedSurface;

    fn mounted() -> (MediaPlayer, Arc<SimulatedSurface>, Arc<FullscreenHost>) {
        let media = Arc::new(SimulatedSurface::new());
        let host = Arc::new(FullscreenHost::headless());
        let mut player = MediaPlayer::new(PlayerProps::new("clip.mp4"));
        player.mount(media.clone(), host.clone());
        (player, media, host)
    }

    #[test]
    fn commands_before_mount_are_ignored() {
        let player = MediaPlayer::new(PlayerProps::new("clip.mp4"));
        player.toggle_play_pause();
        player.toggle_mute();
        player.toggle_fullscreen();
        player.seek(3.0);
        assert_eq!(player.view_state(), ViewState::default());
    }

    #[test]
    fn mount_binds_the_source() {
        let (player, media, _host) = mounted();
        assert!(player.is_mounted());
        assert_eq!(media.src(), "clip.mp4");
    }

    #[test]
    fn mount_registers_six_listeners() {
        let (_player, media, host) = mounted();
        assert_eq!(media.listener_count(), 5);
        assert_eq!(host.listener_count(), 1);
    }

    #[test]
    fn remount_does_not_duplicate_listeners() {
        let (mut player, media, host) = mounted();
        player.mount(media.clone(), host.clone());
        assert_eq!(media.listener_count(), 5);
        assert_eq!(host.listener_count(), 1);
    }

    #[test]
    fn remount_resets_view_state() {
        let (mut player, media, host) = mounted();
        media.simulate_loaded_metadata(30.0);
        media.simulate_time_update(12.0);

        player.mount(media.clone(), host.clone());
        assert_eq!(player.view_state(), ViewState::default());
    }

    #[test]
    fn play_notification_reconciles_optimistic_flag() {
        let (player, media, _host) = mounted();
        player.toggle_play_pause();
        assert!(player.view_state().is_playing);

        // Something else paused the media before our play was delivered.
        media.pause();
        media.flush();
        assert!(!player.view_state().is_playing);
    }

    #[test]
    fn unknown_duration_is_stored_as_zero() {
        let (player, media, _host) = mounted();
        media.simulate_loaded_metadata(f64::INFINITY);
        assert_eq!(player.view_state().duration, 0.0);
    }

    #[test]
    fn mute_mirrors_the_surface() {
        let (player, media, _host) = mounted();
        player.toggle_mute();
        assert!(media.muted());
        assert!(player.view_state().is_muted);

        player.toggle_mute();
        media.flush();
        assert!(!player.view_state().is_muted);
    }

    #[test]
    fn dropping_the_player_releases_listeners() {
        let (player, media, host) = mounted();
        drop(player);
        assert_eq!(media.listener_count(), 0);
        assert_eq!(host.listener_count(), 0);
    }
}
