//! Real-world scenario benchmarks.
//!
//! The voice pool under typical loads, and one pass of the control loop.

mod control;
mod voices;

pub use control::bench_control;
pub use voices::bench_voices;
