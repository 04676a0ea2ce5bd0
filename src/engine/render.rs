//! Audio-thread side of the workstation.
//!
//! Everything in here runs inside the output callback: no locks, no
//! logging, no allocation on the hot path. Control reaches it through
//! lock-free ring buffers only.
//!
//! ```text
//!   voice queue ──▶ PolySynth ──┬──────────────────────▶ out
//!                               │                         ▲
//!   input ring ─────────────────┴──▶ tap ring (capture)   │
//!                                                         │
//!   mixer queue ──▶ LoopPlayer × N ───────────────────────┘
//! ```
//!
//! Loops are mixed into the output but not into the tap, so recording a new
//! layer over running loops does not re-capture them.
//!
//! A loop buffer replaced by `Load` or dropped by `Release` is never freed
//! here. It goes back to the control side on the retire ring.

use std::sync::Arc;

use rtrb::{Consumer, Producer};

use crate::clock::FrameCounter;
use crate::synth::{MessageReceiver, PolySynth};
use crate::MAX_BLOCK_SIZE;

/// Control → audio messages for the loop players
#[derive(Debug, Clone)]
pub enum MixerMessage {
    /// Replace the slot's loop, rewound and paused
    Load {
        slot: usize,
        samples: Arc<[f32]>,
        gain: f32,
    },
    Play { slot: usize },
    Stop { slot: usize },
    Gain { slot: usize, gain: f32 },
    Release { slot: usize },
}

/// Audio-side ends of the loop player channel, see
/// [`playback_channel`](crate::engine::bridge::playback_channel)
pub struct MixerEnd {
    pub(crate) rx: Consumer<MixerMessage>,
    pub(crate) retired: Producer<Arc<[f32]>>,
}

/// One free-running loop
#[derive(Debug, Default)]
struct LoopPlayer {
    samples: Option<Arc<[f32]>>,
    position: usize,
    gain: f32,
    playing: bool,
}

impl LoopPlayer {
    fn render(&mut self, out: &mut [f32]) {
        let Some(samples) = self.samples.as_ref().filter(|s| !s.is_empty()) else {
            return;
        };
        if !self.playing {
            return;
        }
        for sample in out.iter_mut() {
            *sample += samples[self.position] * self.gain;
            self.position += 1;
            if self.position >= samples.len() {
                self.position = 0;
            }
        }
    }
}

pub struct AudioEngine<R: MessageReceiver> {
    synth: PolySynth<R>,
    mixer: MixerEnd,
    players: Vec<LoopPlayer>,
    counter: FrameCounter,
    input_rx: Option<Consumer<f32>>,
    tap_tx: Option<Producer<f32>>,
    scratch: Vec<f32>,
    dropped_tap_samples: u64,
}

impl<R: MessageReceiver> AudioEngine<R> {
    pub fn new(
        synth: PolySynth<R>,
        mixer: MixerEnd,
        slots: usize,
        counter: FrameCounter,
    ) -> Self {
        Self {
            synth,
            mixer,
            players: (0..slots).map(|_| LoopPlayer::default()).collect(),
            counter,
            input_rx: None,
            tap_tx: None,
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            dropped_tap_samples: 0,
        }
    }

    /// Live input samples, mixed into the capture tap only
    pub fn with_input(mut self, input_rx: Consumer<f32>) -> Self {
        self.input_rx = Some(input_rx);
        self
    }

    /// Where the synth + input mix is copied for recording
    pub fn with_tap(mut self, tap_tx: Producer<f32>) -> Self {
        self.tap_tx = Some(tap_tx);
        self
    }

    /// Tap samples lost because nobody drained the capture ring
    pub fn dropped_tap_samples(&self) -> u64 {
        self.dropped_tap_samples
    }

    pub fn synth(&self) -> &PolySynth<R> {
        &self.synth
    }

    /// Fill a mono buffer. The frame clock advances by `out.len()`.
    pub fn render(&mut self, out: &mut [f32]) {
        self.apply_mixer_messages();

        for block in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.synth.render_block(block);

            if let Some(tap) = self.tap_tx.as_mut() {
                let scratch = &mut self.scratch[..block.len()];
                scratch.copy_from_slice(block);
                if let Some(input) = self.input_rx.as_mut() {
                    for s in scratch.iter_mut() {
                        *s += input.pop().unwrap_or(0.0);
                    }
                }
                for &s in scratch.iter() {
                    if tap.push(s).is_err() {
                        self.dropped_tap_samples += 1;
                    }
                }
            } else if let Some(input) = self.input_rx.as_mut() {
                // Nothing records; keep the input ring from backing up
                for _ in 0..block.len() {
                    if input.pop().is_err() {
                        break;
                    }
                }
            }

            for player in &mut self.players {
                player.render(block);
            }

            self.counter.advance(block.len());
        }
    }

    fn apply_mixer_messages(&mut self) {
        while let Ok(msg) = self.mixer.rx.pop() {
            match msg {
                MixerMessage::Load {
                    slot,
                    samples,
                    gain,
                } => {
                    if let Some(p) = self.players.get_mut(slot) {
                        let old = p.samples.replace(samples);
                        p.position = 0;
                        p.gain = gain;
                        p.playing = false;
                        retire(&mut self.mixer.retired, old);
                    }
                }
                MixerMessage::Play { slot } => {
                    if let Some(p) = self.players.get_mut(slot) {
                        p.position = 0;
                        p.playing = true;
                    }
                }
                MixerMessage::Stop { slot } => {
                    if let Some(p) = self.players.get_mut(slot) {
                        p.position = 0;
                        p.playing = false;
                    }
                }
                MixerMessage::Gain { slot, gain } => {
                    if let Some(p) = self.players.get_mut(slot) {
                        p.gain = gain;
                    }
                }
                MixerMessage::Release { slot } => {
                    if let Some(p) = self.players.get_mut(slot) {
                        let old = p.samples.take();
                        p.position = 0;
                        p.playing = false;
                        retire(&mut self.mixer.retired, old);
                    }
                }
            }
        }
    }
}

/// Hand a loop buffer back to the control side for freeing.
///
/// The retire ring is as deep as the mixer queue and the control side
/// drains it before every send, so a push only fails once the control side
/// is gone.
fn retire(retired: &mut Producer<Arc<[f32]>>, samples: Option<Arc<[f32]>>) {
    if let Some(samples) = samples {
        let _ = retired.push(samples);
    }
}
