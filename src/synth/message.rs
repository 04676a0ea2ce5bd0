use std::collections::VecDeque;

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer};

use crate::synth::patch::DrumKind;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    Drum { kind: DrumKind, velocity: u8 },
    /// Metronome click; accented on the downbeat
    Click { accent: bool },
    AllNotesOff,
}

/// A message to apply at `time` (seconds, clock domain).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimedMessage {
    pub time: f64,
    pub message: SynthMessage,
}

/// The sound-producing side, seen from the control thread.
///
/// Fire-and-forget: once a trigger is handed over it cannot be taken back.
pub trait VoiceGraph {
    fn trigger(&mut self, time: f64, message: SynthMessage);
}

/// Collects triggers instead of sounding them (offline rendering, tests)
impl VoiceGraph for Vec<TimedMessage> {
    fn trigger(&mut self, time: f64, message: SynthMessage) {
        self.push(TimedMessage { time, message });
    }
}

impl VoiceGraph for VecDeque<TimedMessage> {
    fn trigger(&mut self, time: f64, message: SynthMessage) {
        self.push_back(TimedMessage { time, message });
    }
}

#[cfg(feature = "rtrb")]
impl VoiceGraph for Producer<TimedMessage> {
    fn trigger(&mut self, time: f64, message: SynthMessage) {
        if self.push(TimedMessage { time, message }).is_err() {
            log::warn!("voice queue full, dropping {message:?}");
        }
    }
}

/// Where the audio side pulls its messages from.
pub trait MessageReceiver {
    fn pop(&mut self) -> Option<TimedMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<TimedMessage> {
    fn pop(&mut self) -> Option<TimedMessage> {
        Consumer::pop(self).ok()
    }
}

impl MessageReceiver for VecDeque<TimedMessage> {
    fn pop(&mut self) -> Option<TimedMessage> {
        self.pop_front()
    }
}
