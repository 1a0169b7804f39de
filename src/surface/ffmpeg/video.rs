use crossbeam_channel::Receiver;
use std::collections::VecDeque;

use super::decoder::DecodedFrame;

/// Frames older than the clock by more than this are dropped (seconds).
const LATE_TOLERANCE: f64 = 0.02;
/// Frames are shown up to this far ahead of the clock (seconds).
const EARLY_TOLERANCE: f64 = 0.02;
/// After a seek, keyframe alignment can land this far before the target.
const SEEK_TOLERANCE: f64 = 0.5;

/// Buffers decoded frames and picks the one due for display.
pub struct FrameQueue {
    receiver: Receiver<DecodedFrame>,
    buffer: VecDeque<DecodedFrame>,
    capacity: usize,
}

impl FrameQueue {
    pub fn new(receiver: Receiver<DecodedFrame>, capacity: usize) -> Self {
        Self {
            receiver,
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn fill(&mut self) {
        while self.buffer.len() < self.capacity {
            match self.receiver.try_recv() {
                Ok(frame) => self.buffer.push_back(frame),
                Err(_) => break,
            }
        }
    }

    /// Drop frames before `threshold`.
    fn skip_before(&mut self, threshold: f64) {
        while self
            .buffer
            .front()
            .is_some_and(|frame| frame.pts < threshold)
        {
            self.buffer.pop_front();
        }
    }

    /// The next frame due at `clock`, if a new one should be shown.
    pub fn due(&mut self, clock: f64) -> Option<DecodedFrame> {
        self.fill();
        self.skip_before(clock - LATE_TOLERANCE);
        if self
            .buffer
            .front()
            .is_some_and(|frame| frame.pts <= clock + EARLY_TOLERANCE)
        {
            self.buffer.pop_front()
        } else {
            None
        }
    }

    /// First frame at or near `target` after a seek.
    pub fn first_after_seek(&mut self, target: f64) -> Option<DecodedFrame> {
        self.fill();
        self.skip_before(target - SEEK_TOLERANCE);
        self.buffer.pop_front()
    }

    /// Discard everything buffered or in flight.
    pub fn clear(&mut self) {
        self.buffer.clear();
        while self.receiver.try_recv().is_ok() {}
    }

    /// Nothing buffered and nothing in flight.
    pub fn is_drained(&self) -> bool {
        self.buffer.is_empty() && self.receiver.is_empty()
    }
}
