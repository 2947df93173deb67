//! Error type shared by the whole crate.

use thiserror::Error;

/// Errors surfaced by the simulation and its configuration layer.
#[derive(Debug, Error)]
pub enum BlobError {
    /// An operation was issued before the state it needs exists.
    #[error("out of sequence: {0}")]
    OutOfSequence(&'static str),

    /// A caller asked for something that has no meaningful interpretation.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A trait value fell outside [0, 1] at construction.
    #[error("{attribute} = {value} is outside [0, 1]")]
    InvariantViolation { attribute: &'static str, value: f64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, BlobError>;
