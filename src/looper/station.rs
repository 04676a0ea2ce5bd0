//! Loop station - N independent slots sharing one capture bus
//!
//! The only coupling between slots is that at most one may be recording.
//! `toggle_record` is the single way into recording: it force-stops any
//! other take first (which is finalized normally) and only then opens the
//! new session.

use crate::error::{Error, Result};
use crate::looper::bus::{CaptureBus, CaptureEvent, Playback};
use crate::looper::slot::{LoopSlot, SlotChange, SlotState};

/// Read-only view of one slot, for UI projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotSnapshot {
    pub index: usize,
    pub state: SlotState,
    pub gain: f32,
    /// Asset size, or bytes captured so far while recording
    pub bytes: usize,
}

pub struct LoopStation {
    slots: Vec<LoopSlot>,
    changes: Vec<SlotChange>,
}

impl LoopStation {
    pub fn new(slots: usize) -> Self {
        Self {
            slots: (0..slots).map(LoopSlot::new).collect(),
            changes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&LoopSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[LoopSlot] {
        &self.slots
    }

    /// Index of the slot currently recording, if any
    pub fn recording_slot(&self) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.state() == SlotState::Recording)
    }

    /// Start recording on an empty slot, or stop the take on a recording one.
    ///
    /// Starting first force-stops whichever other slot is recording. A bus
    /// without an input stream is refused up front with `PermissionDenied`,
    /// before anything is stopped. If the bus still refuses the session
    /// after the force-stop, the slot stays Empty, the error is returned and
    /// the interrupted take finalizes as usual. On Playing, Stopped or
    /// Finalizing slots this does nothing.
    pub fn toggle_record<B: CaptureBus>(&mut self, index: usize, bus: &mut B) -> Result<()> {
        let state = self.get(index)?.state();
        match state {
            SlotState::Recording => {
                let change = self.slots[index].stop_record(bus);
                self.publish(change);
            }
            SlotState::Empty => {
                if !bus.is_available() {
                    log::warn!("slot {index}: cannot start recording: no input stream");
                    return Err(Error::PermissionDenied("capture bus has no input stream".into()));
                }
                for other in 0..self.slots.len() {
                    if other != index && self.slots[other].state() == SlotState::Recording {
                        log::info!("slot {other}: recording interrupted by slot {index}");
                        let change = self.slots[other].stop_record(bus);
                        self.publish(change);
                    }
                }
                match self.slots[index].start_record(bus) {
                    Ok(change) => self.publish(change),
                    Err(err) => {
                        log::warn!("slot {index}: cannot start recording: {err}");
                        return Err(err);
                    }
                }
            }
            SlotState::Finalizing | SlotState::Playing | SlotState::Stopped => {
                log::debug!("slot {index}: record toggle ignored while {}", state.label());
            }
        }
        debug_assert!(self.recording_count() <= 1);
        Ok(())
    }

    /// Route an asynchronous bus delivery to the slot that owns the session.
    pub fn handle_capture<P: Playback>(&mut self, event: CaptureEvent, playback: &mut P) {
        let session = event.session();
        let Some(slot) = self.slots.iter_mut().find(|s| s.session() == Some(session)) else {
            log::trace!("dropping capture event for orphaned session {}", session.0);
            return;
        };
        let change = match event {
            CaptureEvent::Chunk { session, data } => {
                slot.on_chunk(session, data);
                None
            }
            CaptureEvent::Closed { session } => slot.on_closed(session, playback),
            CaptureEvent::Failed { session, reason } => slot.on_failed(session, &reason),
        };
        self.publish(change);
    }

    /// Playing ⇄ Stopped on one slot
    pub fn toggle<P: Playback>(&mut self, index: usize, playback: &mut P) -> Result<()> {
        self.get(index)?;
        let change = self.slots[index].toggle(playback);
        self.publish(change);
        Ok(())
    }

    pub fn clear<B: CaptureBus, P: Playback>(
        &mut self,
        index: usize,
        bus: &mut B,
        playback: &mut P,
    ) -> Result<()> {
        self.get(index)?;
        let change = self.slots[index].clear(bus, playback);
        self.publish(change);
        Ok(())
    }

    pub fn set_gain<P: Playback>(&mut self, index: usize, gain: f32, playback: &mut P) -> Result<()> {
        self.get(index)?;
        self.slots[index].set_gain(gain, playback);
        Ok(())
    }

    /// Nothing keeps playing or recording afterwards. A take in progress is
    /// finalized and lands in Stopped.
    pub fn stop_all<B: CaptureBus, P: Playback>(&mut self, bus: &mut B, playback: &mut P) {
        for i in 0..self.slots.len() {
            let change = self.slots[i].stop(bus, playback);
            self.publish(change);
        }
    }

    /// Resume every Stopped slot from the start
    pub fn play_all<P: Playback>(&mut self, playback: &mut P) {
        for i in 0..self.slots.len() {
            let change = self.slots[i].play(playback);
            self.publish(change);
        }
    }

    pub fn snapshot(&self) -> Vec<SlotSnapshot> {
        self.slots
            .iter()
            .map(|s| SlotSnapshot {
                index: s.index(),
                state: s.state(),
                gain: s.gain(),
                bytes: s.asset().map_or_else(|| s.captured_bytes(), |a| a.len()),
            })
            .collect()
    }

    /// Transitions since the last call, oldest first
    pub fn drain_changes(&mut self) -> Vec<SlotChange> {
        std::mem::take(&mut self.changes)
    }

    fn get(&self, index: usize) -> Result<&LoopSlot> {
        self.slots.get(index).ok_or(Error::InvalidSlot {
            index,
            slots: self.slots.len(),
        })
    }

    fn publish(&mut self, change: Option<SlotChange>) {
        if let Some(change) = change {
            self.changes.push(change);
        }
    }

    fn recording_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state() == SlotState::Recording)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::looper::memory::{MemoryBus, MemoryPlayback};

    struct Rig {
        station: LoopStation,
        bus: MemoryBus,
        playback: MemoryPlayback,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                station: LoopStation::new(3),
                bus: MemoryBus::new(),
                playback: MemoryPlayback::default(),
            }
        }

        fn toggle_record(&mut self, index: usize) {
            self.station.toggle_record(index, &mut self.bus).unwrap();
        }

        fn chunk(&mut self, index: usize, data: &[u8]) {
            let session = self.station.slot(index).unwrap().session().unwrap();
            assert!(self.bus.push_chunk(session, data.to_vec()));
        }

        fn pump(&mut self) {
            for event in self.bus.drain_events() {
                self.station.handle_capture(event, &mut self.playback);
            }
        }

        fn state(&self, index: usize) -> SlotState {
            self.station.slot(index).unwrap().state()
        }

        /// Record `data` on `index` and let it finalize
        fn take(&mut self, index: usize, data: &[u8]) {
            self.toggle_record(index);
            self.chunk(index, data);
            self.toggle_record(index);
            self.pump();
        }
    }

    #[test]
    fn three_chunks_become_one_asset_in_order() {
        let mut rig = Rig::new();
        rig.toggle_record(0);
        rig.chunk(0, &[1, 1]);
        rig.chunk(0, &[2]);
        rig.chunk(0, &[3, 3, 3]);
        rig.toggle_record(0);
        rig.pump();

        assert_eq!(rig.state(0), SlotState::Playing);
        let asset = rig.station.slot(0).unwrap().asset().unwrap();
        assert_eq!(asset.bytes(), &[1, 1, 2, 3, 3, 3]);
        assert!(rig.playback.is_playing(0));
    }

    #[test]
    fn starting_a_take_stops_the_other_one_first() {
        let mut rig = Rig::new();
        rig.toggle_record(0);
        rig.chunk(0, &[5; 4]);
        rig.station.drain_changes();

        rig.toggle_record(1);

        let changes = rig.station.drain_changes();
        assert_eq!(
            changes,
            vec![
                SlotChange { index: 0, from: SlotState::Recording, to: SlotState::Finalizing },
                SlotChange { index: 1, from: SlotState::Empty, to: SlotState::Recording },
            ]
        );

        rig.pump();
        assert_eq!(rig.state(0), SlotState::Playing);
        assert_eq!(rig.state(1), SlotState::Recording);
        assert_eq!(rig.station.recording_slot(), Some(1));
    }

    #[test]
    fn at_most_one_slot_records_for_any_toggle_sequence() {
        let mut rig = Rig::new();
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..500 {
            let index = rng.usize(0..3);
            let _ = rig.station.toggle_record(index, &mut rig.bus);
            if rng.bool() {
                if let Some(s) = rig.station.slot(index).and_then(|s| s.session()) {
                    rig.bus.push_chunk(s, vec![1]);
                }
            }
            if rng.u8(0..4) == 0 {
                let _ = rig.station.clear(rng.usize(0..3), &mut rig.bus, &mut rig.playback);
            }
            if rng.bool() {
                rig.pump();
            }
            let recording = rig
                .station
                .snapshot()
                .iter()
                .filter(|s| s.state == SlotState::Recording)
                .count();
            assert!(recording <= 1);
            assert!(rig.bus.open_sessions().count() <= 1);
        }
    }

    #[test]
    fn permission_denied_keeps_slot_empty_and_station_usable() {
        let mut rig = Rig::new();
        rig.take(2, &[9; 8]);
        rig.bus.set_available(false);

        let err = rig.station.toggle_record(0, &mut rig.bus).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        assert_eq!(rig.state(0), SlotState::Empty);

        rig.station.toggle(2, &mut rig.playback).unwrap();
        assert_eq!(rig.state(2), SlotState::Stopped);

        rig.bus.set_available(true);
        rig.toggle_record(0);
        assert_eq!(rig.state(0), SlotState::Recording);
    }

    #[test]
    fn refused_take_does_not_interrupt_the_running_one() {
        let mut rig = Rig::new();
        rig.toggle_record(0);
        rig.chunk(0, &[4; 4]);
        rig.station.drain_changes();
        rig.bus.set_available(false);

        let err = rig.station.toggle_record(1, &mut rig.bus).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        assert_eq!(rig.state(0), SlotState::Recording);
        assert_eq!(rig.state(1), SlotState::Empty);
        assert!(rig.station.drain_changes().is_empty());

        rig.chunk(0, &[5; 2]);
        rig.toggle_record(0);
        rig.pump();
        let asset = rig.station.slot(0).unwrap().asset().unwrap();
        assert_eq!(asset.bytes(), &[4, 4, 4, 4, 5, 5]);
    }

    #[test]
    fn clear_returns_to_empty_from_every_state() {
        let mut rig = Rig::new();

        rig.toggle_record(0);
        rig.station.clear(0, &mut rig.bus, &mut rig.playback).unwrap();
        assert_eq!(rig.state(0), SlotState::Empty);

        rig.toggle_record(0);
        rig.chunk(0, &[1]);
        rig.toggle_record(0);
        rig.station.clear(0, &mut rig.bus, &mut rig.playback).unwrap();
        assert_eq!(rig.state(0), SlotState::Empty);
        rig.pump();
        assert_eq!(rig.state(0), SlotState::Empty);

        rig.take(0, &[1]);
        assert_eq!(rig.state(0), SlotState::Playing);
        rig.station.clear(0, &mut rig.bus, &mut rig.playback).unwrap();
        assert_eq!(rig.state(0), SlotState::Empty);
        assert!(!rig.playback.is_loaded(0));

        rig.take(0, &[1]);
        rig.station.toggle(0, &mut rig.playback).unwrap();
        assert_eq!(rig.state(0), SlotState::Stopped);
        rig.station.clear(0, &mut rig.bus, &mut rig.playback).unwrap();
        assert_eq!(rig.state(0), SlotState::Empty);
        assert!(rig.station.slot(0).unwrap().asset().is_none());
    }

    #[test]
    fn stop_all_leaves_nothing_playing_or_recording() {
        let mut rig = Rig::new();
        rig.take(0, &[1; 4]);
        rig.toggle_record(1);
        rig.chunk(1, &[2; 4]);

        rig.station.stop_all(&mut rig.bus, &mut rig.playback);
        for s in rig.station.snapshot() {
            assert!(!matches!(s.state, SlotState::Playing | SlotState::Recording));
        }
        assert_eq!(rig.state(2), SlotState::Empty);

        rig.pump();
        assert_eq!(rig.state(0), SlotState::Stopped);
        assert_eq!(rig.state(1), SlotState::Stopped);
        assert_eq!(rig.station.slot(1).unwrap().asset().unwrap().len(), 4);
        assert_eq!(rig.state(2), SlotState::Empty);
    }

    #[test]
    fn play_all_resumes_only_stopped_slots() {
        let mut rig = Rig::new();
        rig.take(0, &[1; 4]);
        rig.take(1, &[2; 4]);
        rig.station.toggle(1, &mut rig.playback).unwrap();

        rig.station.drain_changes();
        rig.station.play_all(&mut rig.playback);

        assert_eq!(rig.state(0), SlotState::Playing);
        assert_eq!(rig.state(1), SlotState::Playing);
        assert_eq!(rig.state(2), SlotState::Empty);
        assert_eq!(rig.station.drain_changes().len(), 1);
    }

    #[test]
    fn record_toggle_on_finished_slot_is_ignored() {
        let mut rig = Rig::new();
        rig.take(0, &[1; 4]);
        rig.toggle_record(0);
        assert_eq!(rig.state(0), SlotState::Playing);
        assert!(rig.bus.open_sessions().next().is_none());
    }

    #[test]
    fn out_of_range_slot_is_an_error() {
        let mut rig = Rig::new();
        let err = rig.station.toggle_record(3, &mut rig.bus).unwrap_err();
        assert!(matches!(err, Error::InvalidSlot { index: 3, slots: 3 }));
        assert!(rig.station.set_gain(9, 0.5, &mut rig.playback).is_err());
    }

    #[test]
    fn failed_capture_reverts_to_empty() {
        let mut rig = Rig::new();
        rig.toggle_record(0);
        rig.chunk(0, &[1, 2]);
        let session = rig.station.slot(0).unwrap().session().unwrap();
        rig.bus.fail(session, "encoder error");
        rig.pump();
        assert_eq!(rig.state(0), SlotState::Empty);
        assert!(rig.station.slot(0).unwrap().asset().is_none());
    }
}
