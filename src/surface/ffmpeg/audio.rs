use rodio::Source;
use std::sync::Arc;
use std::time::Duration;

use super::clock::AudioClock;
use super::ring::SampleRing;

/// Samples advanced on the clock per update.
const CLOCK_BATCH: u64 = 256;

/// Endless rodio source fed by the decoder. Plays silence on underrun and
/// moves the [`AudioClock`] as samples are consumed.
pub struct RingSource {
    ring: Arc<SampleRing<f32>>,
    clock: AudioClock,
    consumed: u64,
}

impl RingSource {
    pub fn new(ring: Arc<SampleRing<f32>>, clock: AudioClock) -> Self {
        Self {
            ring,
            clock,
            consumed: 0,
        }
    }
}

impl Iterator for RingSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.clock.take_discard() {
            self.ring.clear();
            self.consumed = 0;
            return Some(0.0);
        }

        let Some(sample) = self.ring.pop() else {
            return Some(0.0);
        };
        self.consumed += 1;
        if self.consumed % CLOCK_BATCH == 0 {
            self.clock.advance_samples(CLOCK_BATCH);
        }
        Some(sample)
    }
}

impl Source for RingSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.clock.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
