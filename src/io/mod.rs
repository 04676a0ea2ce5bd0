// External interfaces: MIDI parsing and computer-keyboard emulation.
// Both reduce to the same two events, so the core never knows where a note
// came from.

pub mod keyboard;
pub mod midi;

pub use keyboard::KeyMap;
pub use midi::MidiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Note { note: u8, velocity: u8, on: bool },
    /// Record button of one loop slot
    RecordToggle(usize),
}
