//! Loop slot - one track's record/play state machine
//!
//! ```text
//!            start_record            close delivered          toggle
//!   Empty ───────────────▶ Recording ──▶ Finalizing ──▶ Playing ◀──────▶ Stopped
//!     ▲                     stop_record     │  (no chunks)  │                 │
//!     │                                     ▼               │                 │
//!     └──────────────────────────────── Empty ◀─────────────┴── clear ────────┘
//! ```
//!
//! `Finalizing` is the gap between asking the bus to close the session and
//! the bus confirming it. The slot is no longer recording, but its asset
//! does not exist yet.

use crate::error::Result;
use crate::looper::asset::Asset;
use crate::looper::bus::{CaptureBus, Playback, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Recording,
    Finalizing,
    Playing,
    Stopped,
}

impl SlotState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Recording => "recording",
            Self::Finalizing => "finalizing",
            Self::Playing => "playing",
            Self::Stopped => "stopped",
        }
    }

    /// True when an asset is loaded on the playback primitive
    pub fn has_asset(self) -> bool {
        matches!(self, Self::Playing | Self::Stopped)
    }
}

/// One state transition, published in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotChange {
    pub index: usize,
    pub from: SlotState,
    pub to: SlotState,
}

pub struct LoopSlot {
    index: usize,
    state: SlotState,
    /// Session being recorded or finalized
    session: Option<SessionId>,
    /// Captured chunks in arrival order, owned by this slot only
    chunks: Vec<Vec<u8>>,
    asset: Option<Asset>,
    gain: f32,
    /// Land in Stopped instead of Playing once finalized
    park_after_finalize: bool,
}

impl LoopSlot {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            state: SlotState::Empty,
            session: None,
            chunks: Vec::new(),
            asset: None,
            gain: 1.0,
            park_after_finalize: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Bytes captured so far in the current session
    pub fn captured_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Open a capture session. Only reachable through the station, which
    /// keeps recording exclusive.
    pub(crate) fn start_record<B: CaptureBus>(&mut self, bus: &mut B) -> Result<Option<SlotChange>> {
        if self.state != SlotState::Empty {
            return Ok(None);
        }
        let session = bus.open_session()?;
        self.session = Some(session);
        self.chunks.clear();
        self.park_after_finalize = false;
        Ok(self.transition(SlotState::Recording))
    }

    /// Ask the bus to close the session; the asset is built when it confirms.
    pub(crate) fn stop_record<B: CaptureBus>(&mut self, bus: &mut B) -> Option<SlotChange> {
        if self.state != SlotState::Recording {
            return None;
        }
        if let Some(session) = self.session {
            bus.close_session(session);
        }
        self.transition(SlotState::Finalizing)
    }

    pub(crate) fn on_chunk(&mut self, session: SessionId, data: Vec<u8>) {
        if self.owns(session) && matches!(self.state, SlotState::Recording | SlotState::Finalizing) {
            self.chunks.push(data);
        }
    }

    /// The bus finished the session: build the asset and start looping it.
    ///
    /// A bus that closes on its own while still recording is finalized the
    /// same way.
    pub(crate) fn on_closed<P: Playback>(
        &mut self,
        session: SessionId,
        playback: &mut P,
    ) -> Option<SlotChange> {
        if !self.owns(session)
            || !matches!(self.state, SlotState::Recording | SlotState::Finalizing)
        {
            return None;
        }
        self.session = None;

        if self.captured_bytes() == 0 {
            log::warn!("slot {}: capture produced no audio, discarding take", self.index);
            self.chunks.clear();
            return self.transition(SlotState::Empty);
        }

        let asset = Asset::from_chunks(self.chunks.drain(..));
        playback.load(self.index, &asset, self.gain);
        self.asset = Some(asset);

        if std::mem::take(&mut self.park_after_finalize) {
            self.transition(SlotState::Stopped)
        } else {
            playback.play(self.index);
            self.transition(SlotState::Playing)
        }
    }

    pub(crate) fn on_failed(&mut self, session: SessionId, reason: &str) -> Option<SlotChange> {
        if !self.owns(session) {
            return None;
        }
        log::warn!("slot {}: capture failed ({reason}), discarding take", self.index);
        self.session = None;
        self.chunks.clear();
        self.park_after_finalize = false;
        self.transition(SlotState::Empty)
    }

    /// Playing ⇄ Stopped. Anything else is ignored.
    pub(crate) fn toggle<P: Playback>(&mut self, playback: &mut P) -> Option<SlotChange> {
        match self.state {
            SlotState::Playing => {
                playback.stop(self.index);
                self.transition(SlotState::Stopped)
            }
            SlotState::Stopped => self.play(playback),
            _ => None,
        }
    }

    pub(crate) fn play<P: Playback>(&mut self, playback: &mut P) -> Option<SlotChange> {
        if self.state != SlotState::Stopped {
            return None;
        }
        playback.play(self.index);
        self.transition(SlotState::Playing)
    }

    /// Global stop. A take in progress is still finalized, but parks in Stopped.
    pub(crate) fn stop<B: CaptureBus, P: Playback>(
        &mut self,
        bus: &mut B,
        playback: &mut P,
    ) -> Option<SlotChange> {
        match self.state {
            SlotState::Playing => {
                playback.stop(self.index);
                self.transition(SlotState::Stopped)
            }
            SlotState::Recording => {
                self.park_after_finalize = true;
                self.stop_record(bus)
            }
            SlotState::Finalizing => {
                self.park_after_finalize = true;
                None
            }
            SlotState::Empty | SlotState::Stopped => None,
        }
    }

    /// Back to Empty from anywhere, discarding audio and playback resources.
    pub(crate) fn clear<B: CaptureBus, P: Playback>(
        &mut self,
        bus: &mut B,
        playback: &mut P,
    ) -> Option<SlotChange> {
        match self.state {
            SlotState::Empty => return None,
            SlotState::Recording => {
                if let Some(session) = self.session {
                    bus.close_session(session);
                }
            }
            SlotState::Finalizing => {}
            SlotState::Playing | SlotState::Stopped => playback.release(self.index),
        }
        self.session = None;
        self.chunks.clear();
        self.asset = None;
        self.park_after_finalize = false;
        self.transition(SlotState::Empty)
    }

    /// Gain is always accepted; it only reaches the playback path once an
    /// asset is loaded.
    pub(crate) fn set_gain<P: Playback>(&mut self, gain: f32, playback: &mut P) {
        if gain.is_nan() {
            return;
        }
        self.gain = gain.clamp(0.0, 1.0);
        if self.state.has_asset() {
            playback.set_gain(self.index, self.gain);
        }
    }

    fn owns(&self, session: SessionId) -> bool {
        self.session == Some(session)
    }

    fn transition(&mut self, to: SlotState) -> Option<SlotChange> {
        let from = std::mem::replace(&mut self.state, to);
        log::debug!("slot {}: {} -> {}", self.index, from.label(), to.label());
        Some(SlotChange {
            index: self.index,
            from,
            to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::looper::memory::{MemoryBus, MemoryPlayback};

    fn recording_slot(bus: &mut MemoryBus) -> (LoopSlot, SessionId) {
        let mut slot = LoopSlot::new(0);
        slot.start_record(bus).unwrap();
        let session = slot.session().unwrap();
        (slot, session)
    }

    #[test]
    fn record_then_finalize_plays_asset() {
        let mut bus = MemoryBus::new();
        let mut playback = MemoryPlayback::default();
        let (mut slot, session) = recording_slot(&mut bus);

        slot.on_chunk(session, vec![1, 2]);
        slot.on_chunk(session, vec![3]);
        let change = slot.stop_record(&mut bus).unwrap();
        assert_eq!(change.to, SlotState::Finalizing);

        slot.on_closed(session, &mut playback);
        assert_eq!(slot.state(), SlotState::Playing);
        assert_eq!(slot.asset().unwrap().bytes(), &[1, 2, 3]);
        assert!(playback.is_playing(0));
    }

    #[test]
    fn trailing_chunk_after_stop_is_kept() {
        let mut bus = MemoryBus::new();
        let mut playback = MemoryPlayback::default();
        let (mut slot, session) = recording_slot(&mut bus);

        slot.on_chunk(session, vec![1]);
        slot.stop_record(&mut bus);
        slot.on_chunk(session, vec![2]);
        slot.on_closed(session, &mut playback);

        assert_eq!(slot.asset().unwrap().bytes(), &[1, 2]);
    }

    #[test]
    fn empty_capture_reverts_to_empty() {
        let mut bus = MemoryBus::new();
        let mut playback = MemoryPlayback::default();
        let (mut slot, session) = recording_slot(&mut bus);

        slot.stop_record(&mut bus);
        slot.on_closed(session, &mut playback);

        assert_eq!(slot.state(), SlotState::Empty);
        assert!(slot.asset().is_none());
        assert!(!playback.is_loaded(0));
    }

    #[test]
    fn unavailable_bus_leaves_slot_empty() {
        let mut bus = MemoryBus::unavailable();
        let mut slot = LoopSlot::new(1);
        assert!(slot.start_record(&mut bus).is_err());
        assert_eq!(slot.state(), SlotState::Empty);
        assert!(slot.session().is_none());
    }

    #[test]
    fn foreign_session_is_ignored() {
        let mut bus = MemoryBus::new();
        let mut playback = MemoryPlayback::default();
        let (mut slot, session) = recording_slot(&mut bus);
        let stranger = SessionId(session.0 + 100);

        slot.on_chunk(stranger, vec![9]);
        assert_eq!(slot.captured_bytes(), 0);
        assert!(slot.on_closed(stranger, &mut playback).is_none());
        assert_eq!(slot.state(), SlotState::Recording);
    }

    #[test]
    fn toggle_only_moves_between_playing_and_stopped() {
        let mut bus = MemoryBus::new();
        let mut playback = MemoryPlayback::default();
        let mut slot = LoopSlot::new(0);
        assert!(slot.toggle(&mut playback).is_none());

        slot.start_record(&mut bus).unwrap();
        assert!(slot.toggle(&mut playback).is_none());
        let session = slot.session().unwrap();
        slot.on_chunk(session, vec![0; 8]);
        slot.stop_record(&mut bus);
        slot.on_closed(session, &mut playback);

        slot.toggle(&mut playback);
        assert_eq!(slot.state(), SlotState::Stopped);
        assert!(!playback.is_playing(0));
        slot.toggle(&mut playback);
        assert_eq!(slot.state(), SlotState::Playing);
        assert!(playback.is_playing(0));
    }

    #[test]
    fn global_stop_parks_take_in_stopped() {
        let mut bus = MemoryBus::new();
        let mut playback = MemoryPlayback::default();
        let (mut slot, session) = recording_slot(&mut bus);

        slot.on_chunk(session, vec![7; 4]);
        slot.stop(&mut bus, &mut playback);
        assert_eq!(slot.state(), SlotState::Finalizing);
        slot.on_closed(session, &mut playback);

        assert_eq!(slot.state(), SlotState::Stopped);
        assert!(playback.is_loaded(0));
        assert!(!playback.is_playing(0));
    }

    #[test]
    fn clear_while_recording_closes_session() {
        let mut bus = MemoryBus::new();
        let mut playback = MemoryPlayback::default();
        let (mut slot, session) = recording_slot(&mut bus);

        slot.on_chunk(session, vec![1, 2, 3]);
        slot.clear(&mut bus, &mut playback);

        assert_eq!(slot.state(), SlotState::Empty);
        assert!(bus.is_closed(session));
        assert_eq!(slot.captured_bytes(), 0);
        // late confirmation from the bus changes nothing
        assert!(slot.on_closed(session, &mut playback).is_none());
    }

    #[test]
    fn gain_is_clamped_and_applied_once_loaded() {
        let mut bus = MemoryBus::new();
        let mut playback = MemoryPlayback::default();
        let (mut slot, session) = recording_slot(&mut bus);

        slot.set_gain(1.7, &mut playback);
        assert_eq!(slot.gain(), 1.0);
        slot.set_gain(0.4, &mut playback);
        assert_eq!(playback.gain(0), None);

        slot.on_chunk(session, vec![0; 4]);
        slot.stop_record(&mut bus);
        slot.on_closed(session, &mut playback);
        assert_eq!(playback.gain(0), Some(0.4));

        slot.set_gain(-1.0, &mut playback);
        assert_eq!(playback.gain(0), Some(0.0));
        slot.set_gain(f32::NAN, &mut playback);
        assert_eq!(slot.gain(), 0.0);
    }
}
