use crate::error::Result;
use crate::looper::asset::Asset;

/// Identifies one capture session on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// The shared recording tap (synth output mixed with live input).
///
/// The bus itself happily runs several sessions at once; keeping recording
/// exclusive is the station's job.
pub trait CaptureBus {
    /// Whether an input stream was granted, i.e. whether `open_session` can
    /// succeed at all
    fn is_available(&self) -> bool;

    /// Open a capture session. Fails with `PermissionDenied` when no input
    /// stream was granted upstream.
    fn open_session(&mut self) -> Result<SessionId>;

    /// Stop delivering new audio to the session.
    ///
    /// Completion is reported later as [`CaptureEvent::Closed`] (or
    /// [`CaptureEvent::Failed`]); trailing chunks may arrive before it.
    fn close_session(&mut self, session: SessionId);

    /// Deliveries that became ready since the last call, in order
    fn poll(&mut self) -> Vec<CaptureEvent>;
}

/// Asynchronous deliveries from the capture bus to the station.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    Chunk { session: SessionId, data: Vec<u8> },
    Closed { session: SessionId },
    Failed { session: SessionId, reason: String },
}

impl CaptureEvent {
    pub fn session(&self) -> SessionId {
        match self {
            Self::Chunk { session, .. } | Self::Closed { session } | Self::Failed { session, .. } => {
                *session
            }
        }
    }
}

/// The playback primitive each slot's asset is looped on.
///
/// Looping is best effort and free-running per slot.
pub trait Playback {
    /// Load `asset` for `slot`, rewound to position zero and paused
    fn load(&mut self, slot: usize, asset: &Asset, gain: f32);
    /// Loop the loaded asset from position zero
    fn play(&mut self, slot: usize);
    /// Pause and rewind to position zero
    fn stop(&mut self, slot: usize);
    fn set_gain(&mut self, slot: usize, gain: f32);
    /// Drop the loaded asset and any playback resources
    fn release(&mut self, slot: usize);
}
