use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Saw,
    Square,
    Noise,
}

/// Phase-accumulating oscillator. Frequency is supplied per sample so
/// callers can sweep it (kick pitch drops, vibrato).
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    phase: f32,
    rng: fastrand::Rng,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
            rng: fastrand::Rng::with_seed(0x5eed),
        }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine)
    }

    pub fn saw() -> Self {
        Self::new(Waveform::Saw)
    }

    pub fn square() -> Self {
        Self::new(Waveform::Square)
    }

    pub fn noise() -> Self {
        Self::new(Waveform::Noise)
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Restart from phase zero (clean transient on retrigger)
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let out = match self.waveform {
            Waveform::Sine => (TAU * self.phase).sin(),
            Waveform::Saw => 2.0 * self.phase - 1.0,
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Noise => self.rng.f32() * 2.0 - 1.0,
        };

        self.phase += frequency / sample_rate;
        self.phase -= self.phase.floor();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_matches_reference() {
        let sample_rate = 48_000.0;
        let mut osc = Oscillator::sine();
        let samples: Vec<f32> = (0..64).map(|_| osc.next_sample(440.0, sample_rate)).collect();

        let n = 12;
        let expected = (TAU * 440.0 * n as f32 / sample_rate).sin();
        assert!((samples[n] - expected).abs() < 1e-4);
    }

    #[test]
    fn waveforms_stay_in_range() {
        for wf in [Waveform::Sine, Waveform::Saw, Waveform::Square, Waveform::Noise] {
            let mut osc = Oscillator::new(wf);
            for _ in 0..4_800 {
                let s = osc.next_sample(1_234.0, 48_000.0);
                assert!((-1.0..=1.0).contains(&s), "{wf:?} produced {s}");
            }
        }
    }
}
