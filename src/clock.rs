//! Clock domain
//!
//! Every trigger time in the crate is expressed in seconds on a monotonic
//! clock that the audio side can honour with sub-millisecond precision.
//! Wall-clock time is only used by the host for UI and logging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic, high-resolution time source in seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Clock whose time only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start.to_bits())),
        }
    }

    /// Jump to an absolute time. Going backwards is ignored.
    pub fn set(&self, seconds: f64) {
        if seconds >= self.now() {
            self.bits.store(seconds.to_bits(), Ordering::Release);
        }
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds.max(0.0));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

/// Audio clock: frames rendered so far divided by the sample rate.
///
/// The render side owns the matching [`FrameCounter`] and advances it once
/// per callback, so `now()` is exactly the start of the next block to render.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frames: Arc<AtomicU64>,
    sample_rate: f64,
}

/// Writer half of a [`FrameClock`], held by the audio callback.
#[derive(Debug)]
pub struct FrameCounter {
    frames: Arc<AtomicU64>,
}

impl FrameClock {
    pub fn new(sample_rate: f64) -> (Self, FrameCounter) {
        let frames = Arc::new(AtomicU64::new(0));
        (
            Self {
                frames: Arc::clone(&frames),
                sample_rate,
            },
            FrameCounter { frames },
        )
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }
}

impl Clock for FrameClock {
    fn now(&self) -> f64 {
        self.frames() as f64 / self.sample_rate
    }
}

impl FrameCounter {
    pub fn advance(&self, frames: usize) {
        self.frames.fetch_add(frames as u64, Ordering::AcqRel);
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }
}
