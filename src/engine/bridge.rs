//! Control-thread adapters onto the audio engine's ring buffers.
//!
//! [`RtPlayback`] and [`TapBus`] are the real implementations of the
//! station's `Playback` and `CaptureBus` seams.

use std::collections::VecDeque;
use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::engine::render::{MixerEnd, MixerMessage};
use crate::error::{Error, Result};
use crate::looper::asset::{encode_pcm, Asset};
use crate::looper::bus::{CaptureBus, CaptureEvent, Playback, SessionId};

/// Build the loop player channel: the control-side [`RtPlayback`] and the
/// [`MixerEnd`] the audio engine reads from.
///
/// The retire ring gets the same depth as the mixer queue.
pub fn playback_channel(capacity: usize) -> (RtPlayback, MixerEnd) {
    let (tx, rx) = RingBuffer::new(capacity);
    let (retired_tx, retired) = RingBuffer::new(capacity);
    (
        RtPlayback { tx, retired },
        MixerEnd {
            rx,
            retired: retired_tx,
        },
    )
}

/// Plays slot assets on the engine's loop players
pub struct RtPlayback {
    tx: Producer<MixerMessage>,
    /// Loop buffers the engine let go of, freed here
    retired: Consumer<Arc<[f32]>>,
}

impl RtPlayback {
    /// Free loop buffers the engine has handed back. Returns how many.
    pub fn collect_retired(&mut self) -> usize {
        let mut count = 0;
        while self.retired.pop().is_ok() {
            count += 1;
        }
        count
    }

    fn send(&mut self, msg: MixerMessage) {
        self.collect_retired();
        if let Err(err) = self.tx.push(msg) {
            log::warn!("mixer queue full, dropping {:?}", err);
        }
    }
}

impl Playback for RtPlayback {
    fn load(&mut self, slot: usize, asset: &Asset, gain: f32) {
        let samples: Arc<[f32]> = asset.to_pcm().into();
        log::debug!("slot {slot}: loading {} frames", samples.len());
        self.send(MixerMessage::Load {
            slot,
            samples,
            gain,
        });
    }

    fn play(&mut self, slot: usize) {
        self.send(MixerMessage::Play { slot });
    }

    fn stop(&mut self, slot: usize) {
        self.send(MixerMessage::Stop { slot });
    }

    fn set_gain(&mut self, slot: usize, gain: f32) {
        self.send(MixerMessage::Gain { slot, gain });
    }

    fn release(&mut self, slot: usize) {
        self.send(MixerMessage::Release { slot });
    }
}

struct Session {
    id: SessionId,
    pending: Vec<f32>,
}

/// Capture bus over the engine's tap ring.
///
/// Samples reach open sessions only when `poll` runs; the control
/// loop calls it every pass. Without an input stream the bus refuses every
/// session.
pub struct TapBus {
    tap: Option<Consumer<f32>>,
    chunk_frames: usize,
    sessions: Vec<Session>,
    events: VecDeque<CaptureEvent>,
    next_id: u64,
}

impl TapBus {
    pub fn new(tap: Consumer<f32>, chunk_frames: usize) -> Self {
        Self {
            tap: Some(tap),
            chunk_frames: chunk_frames.max(1),
            sessions: Vec::new(),
            events: VecDeque::new(),
            next_id: 0,
        }
    }

    /// A bus for a host that was not granted an input stream
    pub fn unavailable() -> Self {
        Self {
            tap: None,
            chunk_frames: 1,
            sessions: Vec::new(),
            events: VecDeque::new(),
            next_id: 0,
        }
    }

    fn drain_tap(&mut self) {
        let Some(tap) = self.tap.as_mut() else {
            return;
        };
        let available = tap.slots();
        if available == 0 {
            return;
        }
        let Ok(chunk) = tap.read_chunk(available) else {
            return;
        };
        let (first, second) = chunk.as_slices();
        for session in &mut self.sessions {
            session.pending.extend_from_slice(first);
            session.pending.extend_from_slice(second);
        }
        chunk.commit_all();

        for session in &mut self.sessions {
            while session.pending.len() >= self.chunk_frames {
                let rest = session.pending.split_off(self.chunk_frames);
                let full = std::mem::replace(&mut session.pending, rest);
                self.events.push_back(CaptureEvent::Chunk {
                    session: session.id,
                    data: encode_pcm(&full),
                });
            }
        }
    }
}

impl CaptureBus for TapBus {
    fn is_available(&self) -> bool {
        self.tap.is_some()
    }

    fn open_session(&mut self) -> Result<SessionId> {
        if self.tap.is_none() {
            return Err(Error::PermissionDenied(
                "no audio input stream available".into(),
            ));
        }
        // Audio already in the tap predates this take
        self.drain_tap();

        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.sessions.push(Session {
            id,
            pending: Vec::with_capacity(self.chunk_frames),
        });
        log::debug!("capture session {} opened", id.0);
        Ok(id)
    }

    fn close_session(&mut self, session: SessionId) {
        self.drain_tap();
        let Some(pos) = self.sessions.iter().position(|s| s.id == session) else {
            return;
        };
        let closed = self.sessions.remove(pos);
        if !closed.pending.is_empty() {
            self.events.push_back(CaptureEvent::Chunk {
                session,
                data: encode_pcm(&closed.pending),
            });
        }
        self.events.push_back(CaptureEvent::Closed { session });
        log::debug!("capture session {} closed", session.0);
    }

    fn poll(&mut self) -> Vec<CaptureEvent> {
        self.drain_tap();
        self.events.drain(..).collect()
    }
}
