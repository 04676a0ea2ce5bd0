//! Top-level context: one value owning every piece of control-side state.
//!
//! The host drives it with three kinds of stimulus, all handled to
//! completion one at a time:
//!
//! - [`Command`]s from input devices and the UI
//! - due driving-timer ticks ([`Workstation::fire_due_timers`])
//! - capture bus deliveries ([`Workstation::pump_capture`])
//!
//! Between stimuli the host sleeps until [`Workstation::next_deadline`] or
//! the next input, whichever comes first.

use crate::clock::Clock;
use crate::config::Config;
use crate::engine::scheduler::{ScheduledEvent, Scheduler};
use crate::engine::timer::{ArmAt, TimerQueue};
use crate::error::{Error, Result};
use crate::io::InputEvent;
use crate::looper::{CaptureBus, CaptureEvent, LoopStation, Playback, SlotChange, SlotSnapshot};
use crate::synth::{Instrument, SynthMessage, VoiceGraph};

/// What a driving timer was armed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    MetronomeTick,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Input(InputEvent),
    Capture(CaptureEvent),
    StartMetronome,
    StopMetronome,
    ToggleMetronome,
    SetBpm(f64),
    SetBeatsPerBar(u32),
    SetInstrument(Instrument),
    ToggleLoop(usize),
    ClearLoop(usize),
    SetGain { slot: usize, gain: f32 },
    StopAll,
    PlayAll,
    /// Release every sounding synth voice
    AllNotesOff,
}

/// Everything the UI shows, copied out in one go
#[derive(Debug, Clone, PartialEq)]
pub struct WorkstationSnapshot {
    pub bpm: f64,
    pub beats_per_bar: u32,
    pub metronome: bool,
    pub instrument: Instrument,
    pub recording: Option<usize>,
    pub slots: Vec<SlotSnapshot>,
}

pub struct Workstation<C, V, B, P> {
    clock: C,
    voices: V,
    bus: B,
    playback: P,
    scheduler: Scheduler,
    timers: TimerQueue<Task>,
    station: LoopStation,
    instrument: Instrument,
    beats_per_bar: u32,
}

impl<C, V, B, P> Workstation<C, V, B, P>
where
    C: Clock,
    V: VoiceGraph,
    B: CaptureBus,
    P: Playback,
{
    pub fn new(config: &Config, clock: C, voices: V, bus: B, playback: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            clock,
            voices,
            bus,
            playback,
            scheduler: Scheduler::new(config.scheduler_config(), config.tempo.bpm)?,
            timers: TimerQueue::new(),
            station: LoopStation::new(config.station.slots),
            instrument: Instrument::default(),
            beats_per_bar: config.tempo.beats_per_bar,
        })
    }

    pub fn handle(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Input(InputEvent::Note { note, velocity, on }) => {
                if let Some(message) = self.instrument.note_message(note, velocity, on) {
                    let now = self.clock.now();
                    self.voices.trigger(now, message);
                }
            }
            Command::Input(InputEvent::RecordToggle(slot)) => {
                self.station.toggle_record(slot, &mut self.bus)?;
            }
            Command::Capture(event) => self.station.handle_capture(event, &mut self.playback),
            Command::StartMetronome => self.start_metronome(),
            Command::StopMetronome => self.stop_metronome(),
            Command::ToggleMetronome => {
                if self.scheduler.is_running() {
                    self.stop_metronome();
                } else {
                    self.start_metronome();
                }
            }
            Command::SetBpm(bpm) => {
                self.scheduler.set_bpm(bpm)?;
                log::info!("tempo set to {bpm} bpm");
            }
            Command::SetBeatsPerBar(beats) => {
                if beats == 0 {
                    return Err(Error::Config("beats per bar must be at least 1".into()));
                }
                self.beats_per_bar = beats;
            }
            Command::SetInstrument(instrument) => {
                log::info!("instrument: {}", instrument.label());
                self.instrument = instrument;
            }
            Command::ToggleLoop(slot) => self.station.toggle(slot, &mut self.playback)?,
            Command::ClearLoop(slot) => {
                self.station
                    .clear(slot, &mut self.bus, &mut self.playback)?;
            }
            Command::SetGain { slot, gain } => {
                self.station.set_gain(slot, gain, &mut self.playback)?;
            }
            Command::StopAll => self.station.stop_all(&mut self.bus, &mut self.playback),
            Command::PlayAll => self.station.play_all(&mut self.playback),
            Command::AllNotesOff => {
                let now = self.clock.now();
                self.voices.trigger(now, SynthMessage::AllNotesOff);
            }
        }
        Ok(())
    }

    /// Run every driving timer that is due. Returns how many fired.
    pub fn fire_due_timers(&mut self) -> usize {
        let now = self.clock.now();
        let mut due = Vec::new();
        while let Some((_, task)) = self.timers.pop_due(now) {
            due.push(task);
        }
        for task in &due {
            match task {
                Task::MetronomeTick => self.metronome_pass(now, false),
            }
        }
        due.len()
    }

    /// Route everything the capture bus has delivered since the last call
    pub fn pump_capture(&mut self) -> usize {
        let events = self.bus.poll();
        let count = events.len();
        for event in events {
            self.station.handle_capture(event, &mut self.playback);
        }
        count
    }

    /// When the earliest pending timer is due (clock domain)
    pub fn next_deadline(&mut self) -> Option<f64> {
        self.timers.next_deadline()
    }

    pub fn snapshot(&self) -> WorkstationSnapshot {
        WorkstationSnapshot {
            bpm: self.scheduler.tempo().bpm,
            beats_per_bar: self.beats_per_bar,
            metronome: self.scheduler.is_running(),
            instrument: self.instrument,
            recording: self.station.recording_slot(),
            slots: self.station.snapshot(),
        }
    }

    /// Slot transitions since the last call, oldest first
    pub fn drain_changes(&mut self) -> Vec<SlotChange> {
        self.station.drain_changes()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn voices(&self) -> &V {
        &self.voices
    }

    pub fn voices_mut(&mut self) -> &mut V {
        &mut self.voices
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut P {
        &mut self.playback
    }

    pub fn station(&self) -> &LoopStation {
        &self.station
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    fn start_metronome(&mut self) {
        let now = self.clock.now();
        self.metronome_pass(now, true);
    }

    fn stop_metronome(&mut self) {
        let now = self.clock.now();
        let mut timer = ArmAt {
            queue: &mut self.timers,
            now,
            payload: Task::MetronomeTick,
        };
        self.scheduler.stop(&mut timer);
    }

    fn metronome_pass(&mut self, now: f64, starting: bool) {
        let Self {
            voices,
            scheduler,
            timers,
            beats_per_bar,
            ..
        } = self;
        let beats_per_bar = u64::from(*beats_per_bar);

        let mut timer = ArmAt {
            queue: timers,
            now,
            payload: Task::MetronomeTick,
        };
        let mut click = |event: ScheduledEvent| {
            let accent = event.beat % beats_per_bar == 0;
            voices.trigger(event.trigger_time, SynthMessage::Click { accent });
        };

        if starting {
            scheduler.start(now, &mut timer, &mut click);
        } else {
            scheduler.tick(now, &mut timer, &mut click);
        }
    }
}
