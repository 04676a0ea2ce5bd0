//! Low-level DSP primitives used by the synth voices.
//!
//! Allocation-free and realtime-safe, so they can live directly inside
//! voice structs on the audio thread.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// State-variable filter.
pub mod filter;
/// Oscillator waveforms and noise.
pub mod oscillator;

pub use envelope::{Envelope, EnvelopeStage};
pub use filter::SVFilter;
pub use oscillator::{Oscillator, Waveform};
