//! loopdeck - a lookahead metronome and a multi-slot loop station around a
//! small polyphonic synth.
//!
//! The control side ([`Workstation`]) decides *when* things sound and which
//! loop slot is doing what; the audio side ([`engine::render`]) only renders.

pub mod clock;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod io;
pub mod looper;
pub mod synth;
pub mod workstation;

pub use config::Config;
pub use error::{Error, Result};
pub use workstation::{Command, Workstation, WorkstationSnapshot};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
