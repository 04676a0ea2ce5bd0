//! Lookahead beat scheduler.
//!
//! A coarse repeating timer drives `tick`, but beat times are never taken
//! from the timer. They are seeded once from the clock at `start` and then
//! advanced by pure beat arithmetic, so the spacing between beats is exactly
//! `60 / bpm` no matter how late the timer fires.
//!
//! ```text
//!   timer fires ──▶ tick(now)
//!                     while next_event_time < now + schedule_ahead:
//!                         emit(next_event_time)
//!                         next_event_time += 60 / bpm
//!                     re-arm timer after lookahead_interval
//! ```
//!
//! Emitted events are handed off to the voice graph and cannot be taken
//! back. Stopping only cancels the next timer arming.

use std::time::Duration;

use crate::engine::timer::{DrivingTimer, TimerId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// How often the driving timer fires
    pub lookahead_interval: Duration,
    /// How far ahead of `now` (seconds, clock domain) events may be emitted
    pub schedule_ahead: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookahead_interval: Duration::from_millis(25),
            schedule_ahead: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Beat,
}

/// A concretely timed trigger. Lives for one scheduling pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    pub trigger_time: f64,
    pub kind: EventKind,
    /// Beats emitted since `start`, starting at 0
    pub beat: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoState {
    pub bpm: f64,
    pub next_event_time: f64,
    pub is_running: bool,
}

/// Receives events as they are scheduled.
pub trait EventSink {
    fn emit(&mut self, event: ScheduledEvent);
}

impl<F: FnMut(ScheduledEvent)> EventSink for F {
    fn emit(&mut self, event: ScheduledEvent) {
        self(event)
    }
}

impl EventSink for Vec<ScheduledEvent> {
    fn emit(&mut self, event: ScheduledEvent) {
        self.push(event);
    }
}

pub struct Scheduler {
    config: SchedulerConfig,
    tempo: TempoState,
    beat: u64,
    pending: Option<TimerId>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, bpm: f64) -> Result<Self> {
        validate_bpm(bpm)?;
        Ok(Self {
            config,
            tempo: TempoState {
                bpm,
                next_event_time: 0.0,
                is_running: false,
            },
            beat: 0,
            pending: None,
        })
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    pub fn tempo(&self) -> TempoState {
        self.tempo
    }

    pub fn is_running(&self) -> bool {
        self.tempo.is_running
    }

    /// Seconds between beats at the current tempo
    pub fn beat_interval(&self) -> f64 {
        60.0 / self.tempo.bpm
    }

    /// Change the tempo.
    ///
    /// Already-emitted events keep their times; only the next advance uses
    /// the new interval.
    pub fn set_bpm(&mut self, bpm: f64) -> Result<()> {
        validate_bpm(bpm)?;
        self.tempo.bpm = bpm;
        Ok(())
    }

    /// Seed the beat time from the clock and run the first pass immediately.
    ///
    /// Returns the number of events emitted by that first pass. Starting an
    /// already running scheduler does nothing.
    pub fn start<T, S>(&mut self, now: f64, timer: &mut T, sink: &mut S) -> usize
    where
        T: DrivingTimer,
        S: EventSink,
    {
        if self.tempo.is_running {
            return 0;
        }
        self.tempo.next_event_time = now;
        self.tempo.is_running = true;
        self.beat = 0;
        log::debug!("scheduler started at {now:.4}s, {} bpm", self.tempo.bpm);
        self.tick(now, timer, sink)
    }

    /// One scheduling pass, then re-arm the driving timer.
    ///
    /// If the timer was starved the backlog is emitted here in one burst;
    /// no beat is skipped.
    pub fn tick<T, S>(&mut self, now: f64, timer: &mut T, sink: &mut S) -> usize
    where
        T: DrivingTimer,
        S: EventSink,
    {
        if !self.tempo.is_running {
            return 0;
        }

        let horizon = now + self.config.schedule_ahead;
        let mut emitted = 0;
        while self.tempo.next_event_time < horizon {
            sink.emit(ScheduledEvent {
                trigger_time: self.tempo.next_event_time,
                kind: EventKind::Beat,
                beat: self.beat,
            });
            self.advance();
            emitted += 1;
        }
        if emitted > 1 {
            log::trace!("scheduler caught up {emitted} beats at {now:.4}s");
        }

        self.pending = Some(timer.arm(self.config.lookahead_interval));
        emitted
    }

    /// Stop scheduling. Pre-scheduled events are not retracted.
    pub fn stop<T: DrivingTimer>(&mut self, timer: &mut T) {
        self.tempo.is_running = false;
        if let Some(id) = self.pending.take() {
            timer.cancel(id);
        }
        log::debug!("scheduler stopped after {} beats", self.beat);
    }

    fn advance(&mut self) {
        self.tempo.next_event_time += 60.0 / self.tempo.bpm;
        self.beat += 1;
    }
}

fn validate_bpm(bpm: f64) -> Result<()> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTempo(bpm))
    }
}
