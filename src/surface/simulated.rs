use egui::Context;
use parking_lot::Mutex;

use super::{deliver_pending, MediaEvent, MediaListener, MediaSurface};
use crate::events::{ListenerId, ListenerRegistry};

struct Playback {
    src: String,
    paused: bool,
    muted: bool,
    volume: f32,
    current_time: f64,
    duration: f64,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            src: String::new(),
            paused: true,
            muted: false,
            volume: 1.0,
            current_time: 0.0,
            duration: 0.0,
        }
    }
}

/// Clock-driven media surface that decodes nothing.
///
/// Commands queue their notifications exactly like a real element; they are
/// delivered by [`flush`](Self::flush) or [`MediaSurface::update`]. The
/// `simulate_*` hooks and [`advance`](Self::advance) stand in for the
/// platform and deliver everything pending immediately.
#[derive(Default)]
pub struct SimulatedSurface {
    playback: Mutex<Playback>,
    listeners: ListenerRegistry<MediaEvent, MediaListener>,
}

impl SimulatedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver all queued notifications, oldest first.
    pub fn flush(&self) {
        deliver_pending(self, &self.listeners);
    }

    /// Metadata finished loading with the given duration.
    pub fn simulate_loaded_metadata(&self, duration: f64) {
        self.playback.lock().duration = duration;
        self.listeners.queue(MediaEvent::LoadedMetadata);
        self.flush();
    }

    /// The playback position moved to `seconds`.
    pub fn simulate_time_update(&self, seconds: f64) {
        self.playback.lock().current_time = seconds;
        self.listeners.queue(MediaEvent::TimeUpdate);
        self.flush();
    }

    /// The volume was changed outside the widget, e.g. by a system mixer.
    pub fn simulate_volume(&self, volume: f32) {
        self.playback.lock().volume = volume.clamp(0.0, 1.0);
        self.listeners.queue(MediaEvent::VolumeChange);
        self.flush();
    }

    /// Advance the playback clock by `seconds` if playing. Reaching the end
    /// pauses the surface.
    pub fn advance(&self, seconds: f64) {
        {
            let mut playback = self.playback.lock();
            if !playback.paused && playback.duration > 0.0 {
                playback.current_time = (playback.current_time + seconds).min(playback.duration);
                self.listeners.queue(MediaEvent::TimeUpdate);
                if playback.current_time >= playback.duration {
                    playback.paused = true;
                    self.listeners.queue(MediaEvent::Pause);
                }
            }
        }
        self.flush();
    }

    /// Live listener registrations.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Snapshot of the listeners bound to `event`.
    pub fn listeners(&self, event: MediaEvent) -> Vec<MediaListener> {
        self.listeners.listeners(event)
    }
}

impl MediaSurface for SimulatedSurface {
    fn set_src(&self, src: &str) {
        let mut playback = self.playback.lock();
        let (muted, volume) = (playback.muted, playback.volume);
        *playback = Playback {
            src: src.to_owned(),
            muted,
            volume,
            ..Playback::default()
        };
    }

    fn src(&self) -> String {
        self.playback.lock().src.clone()
    }

    fn play(&self) {
        let mut playback = self.playback.lock();
        if !playback.paused {
            return;
        }
        if playback.duration > 0.0 && playback.current_time >= playback.duration {
            playback.current_time = 0.0;
            self.listeners.queue(MediaEvent::TimeUpdate);
        }
        playback.paused = false;
        self.listeners.queue(MediaEvent::Play);
    }

    fn pause(&self) {
        let mut playback = self.playback.lock();
        if !playback.paused {
            playback.paused = true;
            self.listeners.queue(MediaEvent::Pause);
        }
    }

    fn paused(&self) -> bool {
        self.playback.lock().paused
    }

    fn muted(&self) -> bool {
        self.playback.lock().muted
    }

    fn set_muted(&self, muted: bool) {
        let mut playback = self.playback.lock();
        if playback.muted != muted {
            playback.muted = muted;
            self.listeners.queue(MediaEvent::VolumeChange);
        }
    }

    fn volume(&self) -> f32 {
        self.playback.lock().volume
    }

    fn current_time(&self) -> f64 {
        self.playback.lock().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        let mut playback = self.playback.lock();
        let upper = playback.duration.max(0.0);
        playback.current_time = if seconds.is_finite() {
            seconds.clamp(0.0, upper)
        } else {
            0.0
        };
        self.listeners.queue(MediaEvent::TimeUpdate);
    }

    fn duration(&self) -> f64 {
        self.playback.lock().duration
    }

    fn add_listener(&self, event: MediaEvent, listener: MediaListener) -> ListenerId {
        self.listeners.add(event, listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn update(&self, ctx: &Context) {
        let dt = ctx.input(|i| i.stable_dt) as f64;
        self.advance(dt);
        if !self.paused() {
            ctx.request_repaint();
        }
    }
}
