//! Computer keyboard as a one-octave piano.
//!
//! ```text
//!    w e   t y u        black keys
//!   a s d f g h j k     white keys, a = C
//!
//!   z / x   octave down / up
//!   1..9    record toggle for loop slot 0..8
//! ```

use std::collections::HashMap;

use crate::io::InputEvent;

/// Middle C
pub const BASE_NOTE: u8 = 60;

/// Velocity for every key press; keys have no touch sensitivity
pub const DEFAULT_VELOCITY: u8 = 100;

/// Note keys in semitone order starting at C
const NOTE_KEYS: [char; 13] = ['a', 'w', 's', 'e', 'd', 'f', 't', 'g', 'y', 'h', 'u', 'j', 'k'];

const MAX_OCTAVE_SHIFT: i8 = 4;

#[derive(Debug, Clone)]
pub struct KeyMap {
    base_note: u8,
    velocity: u8,
    octave: i8,
    /// Key → note it sounded, so a release after an octave shift still
    /// stops the right note
    held: HashMap<char, u8>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new(BASE_NOTE, DEFAULT_VELOCITY)
    }
}

impl KeyMap {
    pub fn new(base_note: u8, velocity: u8) -> Self {
        Self {
            base_note: base_note.min(127),
            velocity: velocity.clamp(1, 127),
            octave: 0,
            held: HashMap::new(),
        }
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// Key went down. Auto-repeat of a held key produces nothing.
    pub fn press(&mut self, key: char) -> Option<InputEvent> {
        let key = key.to_ascii_lowercase();
        match key {
            'z' => {
                self.octave = (self.octave - 1).max(-MAX_OCTAVE_SHIFT);
                None
            }
            'x' => {
                self.octave = (self.octave + 1).min(MAX_OCTAVE_SHIFT);
                None
            }
            '1'..='9' => {
                let slot = key.to_digit(10)? as usize - 1;
                Some(InputEvent::RecordToggle(slot))
            }
            _ => {
                if self.held.contains_key(&key) {
                    return None;
                }
                let note = self.note_for(key)?;
                self.held.insert(key, note);
                Some(InputEvent::Note {
                    note,
                    velocity: self.velocity,
                    on: true,
                })
            }
        }
    }

    /// Key went up. Only keys that sounded a note produce a note-off.
    pub fn release(&mut self, key: char) -> Option<InputEvent> {
        let note = self.held.remove(&key.to_ascii_lowercase())?;
        Some(InputEvent::Note {
            note,
            velocity: 0,
            on: false,
        })
    }

    /// Note-offs for every held key (focus lost, terminal without key-up events)
    pub fn release_all(&mut self) -> Vec<InputEvent> {
        self.held
            .drain()
            .map(|(_, note)| InputEvent::Note {
                note,
                velocity: 0,
                on: false,
            })
            .collect()
    }

    fn note_for(&self, key: char) -> Option<u8> {
        let offset = NOTE_KEYS.iter().position(|&k| k == key)? as i16;
        let note = self.base_note as i16 + 12 * self.octave as i16 + offset;
        u8::try_from(note).ok().filter(|n| *n <= 127)
    }
}
