// Purpose: multi-track loop recording and playback
// Slots record from the shared capture bus, then loop their take on the
// playback primitive. The station keeps recording exclusive.

pub mod asset;
pub mod bus;
pub mod memory;
pub mod slot;
pub mod station;

pub use asset::Asset;
pub use bus::{CaptureBus, CaptureEvent, Playback, SessionId};
pub use slot::{LoopSlot, SlotChange, SlotState};
pub use memory::{MemoryBus, MemoryPlayback};
pub use station::{LoopStation, SlotSnapshot};
