//! In-process capture bus and playback, for headless use and tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{Error, Result};
use crate::looper::asset::Asset;
use crate::looper::bus::{CaptureBus, CaptureEvent, Playback, SessionId};

/// Capture bus fed by hand.
///
/// Chunks are queued with [`MemoryBus::push_chunk`]; closing a session
/// queues its `Closed` confirmation. Nothing is delivered until the owner
/// drains the queue, which mirrors the asynchronous real bus.
#[derive(Debug, Default)]
pub struct MemoryBus {
    available: bool,
    next_id: u64,
    open: BTreeSet<SessionId>,
    closed: BTreeSet<SessionId>,
    pending: VecDeque<CaptureEvent>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }

    /// A bus whose input permission was never granted
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Queue a chunk for an open session. Returns false if the session is not open.
    pub fn push_chunk(&mut self, session: SessionId, data: Vec<u8>) -> bool {
        if !self.open.contains(&session) {
            return false;
        }
        self.pending.push_back(CaptureEvent::Chunk { session, data });
        true
    }

    /// Queue a failure for an open session and close it.
    pub fn fail(&mut self, session: SessionId, reason: impl Into<String>) {
        if self.open.remove(&session) {
            self.closed.insert(session);
            self.pending.push_back(CaptureEvent::Failed {
                session,
                reason: reason.into(),
            });
        }
    }

    pub fn drain_events(&mut self) -> Vec<CaptureEvent> {
        self.pending.drain(..).collect()
    }

    pub fn open_sessions(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.open.iter().copied()
    }

    pub fn is_open(&self, session: SessionId) -> bool {
        self.open.contains(&session)
    }

    pub fn is_closed(&self, session: SessionId) -> bool {
        self.closed.contains(&session)
    }
}

impl CaptureBus for MemoryBus {
    fn is_available(&self) -> bool {
        self.available
    }

    fn open_session(&mut self) -> Result<SessionId> {
        if !self.available {
            return Err(Error::PermissionDenied("capture bus has no input stream".into()));
        }
        let session = SessionId(self.next_id);
        self.next_id += 1;
        self.open.insert(session);
        Ok(session)
    }

    fn close_session(&mut self, session: SessionId) {
        if self.open.remove(&session) {
            self.closed.insert(session);
            self.pending.push_back(CaptureEvent::Closed { session });
        }
    }

    fn poll(&mut self) -> Vec<CaptureEvent> {
        self.drain_events()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub asset: Asset,
    pub gain: f32,
    pub playing: bool,
}

/// Playback that only remembers what it was told.
#[derive(Debug, Default)]
pub struct MemoryPlayback {
    players: BTreeMap<usize, PlayerState>,
}

impl MemoryPlayback {
    pub fn player(&self, slot: usize) -> Option<&PlayerState> {
        self.players.get(&slot)
    }

    pub fn is_loaded(&self, slot: usize) -> bool {
        self.players.contains_key(&slot)
    }

    pub fn is_playing(&self, slot: usize) -> bool {
        self.players.get(&slot).is_some_and(|p| p.playing)
    }

    pub fn gain(&self, slot: usize) -> Option<f32> {
        self.players.get(&slot).map(|p| p.gain)
    }
}

impl Playback for MemoryPlayback {
    fn load(&mut self, slot: usize, asset: &Asset, gain: f32) {
        self.players.insert(
            slot,
            PlayerState {
                asset: asset.clone(),
                gain,
                playing: false,
            },
        );
    }

    fn play(&mut self, slot: usize) {
        if let Some(p) = self.players.get_mut(&slot) {
            p.playing = true;
        }
    }

    fn stop(&mut self, slot: usize) {
        if let Some(p) = self.players.get_mut(&slot) {
            p.playing = false;
        }
    }

    fn set_gain(&mut self, slot: usize, gain: f32) {
        if let Some(p) = self.players.get_mut(&slot) {
            p.gain = gain;
        }
    }

    fn release(&mut self, slot: usize) {
        self.players.remove(&slot);
    }
}
