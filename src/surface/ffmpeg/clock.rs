use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Master clock driven by consumed audio samples.
///
/// Shared between the decoder thread, the audio callback and the surface.
#[derive(Clone)]
pub struct AudioClock {
    position_us: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    /// Set on seek so the audio callback discards stale samples.
    discard_buffered: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
}

impl AudioClock {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            position_us: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            discard_buffered: Arc::new(AtomicBool::new(false)),
            sample_rate,
            channels,
        }
    }

    /// Position in seconds.
    pub fn position(&self) -> f64 {
        self.position_us.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    /// Jump to `seconds` and flag buffered audio as stale.
    pub fn set_position(&self, seconds: f64) {
        let us = (seconds.max(0.0) * 1_000_000.0) as u64;
        self.position_us.store(us, Ordering::Relaxed);
        self.discard_buffered.store(true, Ordering::Relaxed);
    }

    /// Returns true once after each [`set_position`](Self::set_position).
    pub fn take_discard(&self) -> bool {
        self.discard_buffered.swap(false, Ordering::Relaxed)
    }

    /// Account for `samples` interleaved samples having been played.
    pub fn advance_samples(&self, samples: u64) {
        if !self.running.load(Ordering::Relaxed) {
            return;
        }
        let per_second = self.sample_rate as f64 * self.channels as f64;
        let delta_us = (samples as f64 * 1_000_000.0 / per_second) as u64;
        self.position_us.fetch_add(delta_us, Ordering::Relaxed);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::Relaxed);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}
