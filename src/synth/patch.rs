//! Instrument modes and the sounds a voice can be set up as.

use crate::synth::message::SynthMessage;

/// What incoming notes play. Chosen once per trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Instrument {
    #[default]
    Synth,
    Drums,
}

impl Instrument {
    pub fn label(self) -> &'static str {
        match self {
            Self::Synth => "synth",
            Self::Drums => "drums",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Synth => Self::Drums,
            Self::Drums => Self::Synth,
        }
    }

    /// Translate a note event into the message this instrument sounds.
    ///
    /// Drums are one-shots, so their note-offs produce nothing.
    pub fn note_message(self, note: u8, velocity: u8, on: bool) -> Option<SynthMessage> {
        match (self, on) {
            (Self::Synth, true) => Some(SynthMessage::NoteOn { note, velocity }),
            (Self::Synth, false) => Some(SynthMessage::NoteOff { note }),
            (Self::Drums, true) => Some(SynthMessage::Drum {
                kind: DrumKind::from_note(note),
                velocity,
            }),
            (Self::Drums, false) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumKind {
    Kick,
    Snare,
    ClosedHat,
    OpenHat,
    Clap,
    Tom,
}

impl DrumKind {
    /// Pitch class to drum, loosely after the General MIDI kit layout
    pub fn from_note(note: u8) -> Self {
        match note % 12 {
            0 => Self::Kick,
            2 => Self::Snare,
            1 | 3 => Self::Clap,
            6 | 8 => Self::ClosedHat,
            10 | 11 => Self::OpenHat,
            _ => Self::Tom,
        }
    }
}

/// How a voice is configured for one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patch {
    Lead,
    Drum(DrumKind),
    Click { accent: bool },
}

impl Patch {
    /// Percussive patches end on their own and ignore note-off
    pub fn is_one_shot(self) -> bool {
        !matches!(self, Self::Lead)
    }
}
