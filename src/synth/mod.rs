// Voice management, polyphony and the message protocol the control side
// uses to trigger sound

pub mod message;
pub mod patch;
pub mod poly;
pub mod voice;

pub use message::{MessageReceiver, SynthMessage, TimedMessage, VoiceGraph};
pub use patch::{DrumKind, Instrument, Patch};
pub use poly::PolySynth;
pub use voice::{midi_note_to_freq, Voice, VoiceState};
