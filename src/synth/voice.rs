use crate::dsp::{envelope::Envelope, filter::SVFilter, oscillator::Oscillator};
use crate::synth::patch::{DrumKind, Patch};

/// MIDI note number to Hz (A4 = 69 = 440 Hz)
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Sounding, key held (or one-shot running)
    Releasing, // Key released, envelope in release phase
}

/// One voice of the pool. Reconfigured for a patch on every start.
pub struct Voice {
    patch: Patch,
    note: u8,
    gain: f32,
    state: VoiceState,
    age: u64,
    sample_rate: f32,
    /// Samples since start, drives pitch sweeps
    elapsed: u32,

    tone: Oscillator,
    noise: Oscillator,
    env: Envelope,
    filter: SVFilter,
}

impl Voice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            patch: Patch::Lead,
            note: 0,
            gain: 0.0,
            state: VoiceState::Free,
            age: 0,
            sample_rate,
            elapsed: 0,
            tone: Oscillator::saw(),
            noise: Oscillator::noise(),
            env: Envelope::adsr(0.01, 0.1, 0.7, 0.3),
            filter: SVFilter::lowpass(2_500.0),
        }
    }

    pub fn start(&mut self, patch: Patch, note: u8, velocity: u8, age: u64) {
        self.patch = patch;
        self.note = note;
        self.gain = velocity.min(127) as f32 / 127.0;
        self.state = VoiceState::Active;
        self.age = age;
        self.elapsed = 0;

        let (tone, env, filter) = match patch {
            Patch::Lead => (
                Oscillator::saw(),
                Envelope::adsr(0.01, 0.1, 0.7, 0.3),
                SVFilter::lowpass(2_500.0),
            ),
            Patch::Drum(DrumKind::Kick) => (
                Oscillator::sine(),
                Envelope::percussive(0.001, 0.15, 0.05),
                SVFilter::lowpass(200.0),
            ),
            Patch::Drum(DrumKind::Snare) => (
                Oscillator::sine(),
                Envelope::percussive(0.001, 0.12, 0.05),
                SVFilter::highpass(1_200.0),
            ),
            Patch::Drum(DrumKind::ClosedHat) => (
                Oscillator::square(),
                Envelope::percussive(0.001, 0.04, 0.02),
                SVFilter::highpass(7_000.0),
            ),
            Patch::Drum(DrumKind::OpenHat) => (
                Oscillator::square(),
                Envelope::percussive(0.001, 0.25, 0.1),
                SVFilter::highpass(7_000.0),
            ),
            Patch::Drum(DrumKind::Clap) => (
                Oscillator::sine(),
                Envelope::percussive(0.001, 0.09, 0.04),
                SVFilter::bandpass(1_500.0).with_resonance(0.4),
            ),
            Patch::Drum(DrumKind::Tom) => (
                Oscillator::sine(),
                Envelope::percussive(0.001, 0.2, 0.08),
                SVFilter::lowpass(800.0),
            ),
            Patch::Click { .. } => (
                Oscillator::sine(),
                Envelope::percussive(0.001, 0.03, 0.01),
                SVFilter::lowpass(8_000.0),
            ),
        };
        self.tone = tone;
        self.env = env;
        self.filter = filter;
        self.noise.reset();
        self.env.note_on();
    }

    /// Key released. One-shots ignore it and run to completion.
    pub fn release(&mut self) {
        if self.state == VoiceState::Active && !self.patch.is_one_shot() {
            self.state = VoiceState::Releasing;
            self.env.note_off(self.sample_rate);
        }
    }

    /// Mix this voice into `out`
    pub fn render(&mut self, out: &mut [f32]) {
        if self.state == VoiceState::Free {
            return;
        }
        for sample in out.iter_mut() {
            *sample += self.next_sample();
        }
        if !self.env.is_active() {
            self.free();
        }
    }

    fn next_sample(&mut self) -> f32 {
        let sr = self.sample_rate;
        let t = self.elapsed as f32 / sr;
        self.elapsed = self.elapsed.saturating_add(1);

        let raw = match self.patch {
            Patch::Lead => 0.3 * self.tone.next_sample(midi_note_to_freq(self.note), sr),
            Patch::Drum(DrumKind::Kick) => {
                // 150 Hz falling to 50 Hz gives the punch
                let freq = 50.0 + 100.0 * (-t / 0.03).exp();
                self.tone.next_sample(freq, sr)
            }
            Patch::Drum(DrumKind::Tom) => {
                let freq = 110.0 + 50.0 * (-t / 0.05).exp();
                self.tone.next_sample(freq, sr)
            }
            Patch::Drum(DrumKind::Snare) => {
                0.6 * self.noise.next_sample(0.0, sr) + 0.4 * self.tone.next_sample(180.0, sr)
            }
            Patch::Drum(DrumKind::ClosedHat | DrumKind::OpenHat) => {
                // Metallic square partial under the noise
                0.8 * self.noise.next_sample(0.0, sr) + 0.2 * self.tone.next_sample(6_000.0, sr)
            }
            Patch::Drum(DrumKind::Clap) => self.noise.next_sample(0.0, sr),
            Patch::Click { accent } => {
                let freq = if accent { 1_500.0 } else { 1_000.0 };
                self.tone.next_sample(freq, sr)
            }
        };

        let filtered = self.filter.process(raw, sr);
        filtered * self.env.next_sample(sr) * self.gain
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.note = 0;
        self.gain = 0.0;
        self.env.reset();
    }

    pub fn patch(&self) -> Patch {
        self.patch
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn envelope_level(&self) -> f32 {
        self.env.level()
    }
}
