// Timing and rendering: the lookahead scheduler on the control side, the
// render loop on the audio side, and the ring-buffer bridge between them

#[cfg(feature = "rtrb")]
pub mod bridge;
#[cfg(feature = "rtrb")]
pub mod render;
pub mod scheduler;
pub mod timer;

#[cfg(feature = "rtrb")]
pub use bridge::{playback_channel, RtPlayback, TapBus};
#[cfg(feature = "rtrb")]
pub use render::{AudioEngine, MixerEnd, MixerMessage};
pub use scheduler::{EventKind, EventSink, ScheduledEvent, Scheduler, SchedulerConfig, TempoState};
pub use timer::{ArmAt, DrivingTimer, TimerId, TimerQueue};
