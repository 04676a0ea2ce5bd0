use crate::io::InputEvent;

/// The channel-voice messages the workstation reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
}

impl MidiEvent {
    /// Parse one raw MIDI message.
    ///
    /// Only note on/off are extracted; a note-on with velocity 0 is a
    /// note-off (running-status keyboards send those). Anything else,
    /// including truncated messages, is `None`.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0F;
        let (key, velocity) = match data {
            [key, velocity, ..] => (key & 0x7F, velocity & 0x7F),
            _ => return None,
        };

        match status & 0xF0 {
            0x90 if velocity > 0 => Some(Self::NoteOn {
                channel,
                key,
                velocity,
            }),
            0x90 | 0x80 => Some(Self::NoteOff {
                channel,
                key,
                velocity,
            }),
            _ => None,
        }
    }

    pub fn channel(self) -> u8 {
        match self {
            Self::NoteOn { channel, .. } | Self::NoteOff { channel, .. } => channel,
        }
    }
}

impl From<MidiEvent> for InputEvent {
    fn from(event: MidiEvent) -> Self {
        match event {
            MidiEvent::NoteOn { key, velocity, .. } => InputEvent::Note {
                note: key,
                velocity,
                on: true,
            },
            MidiEvent::NoteOff { key, .. } => InputEvent::Note {
                note: key,
                velocity: 0,
                on: false,
            },
        }
    }
}
