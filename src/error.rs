//! Error types for loopdeck

use thiserror::Error;

/// Result type alias for loopdeck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core.
///
/// None of these are fatal to the whole process: each one is scoped to a
/// single slot or a single subsystem, and the caller decides whether to retry.
#[derive(Debug, Error)]
pub enum Error {
    /// Capture bus or input stream unavailable (no input permission upstream)
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Loop slot index out of range
    #[error("no loop slot at index {index} (station has {slots} slots)")]
    InvalidSlot { index: usize, slots: usize },

    /// Tempo must be finite and strictly positive
    #[error("invalid tempo: {0} bpm")]
    InvalidTempo(f64),

    /// Configuration value out of range
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
