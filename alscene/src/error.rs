//! Error types for alscene

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlSceneError {
    /// A file path or a registered global effect/filter name does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Audio data could not be parsed or decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// An effect or filter type name outside the supported set.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// The backend could not allocate a source, buffer, effect, filter or slot.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The operation is illegal in the current state, e.g. positioning a direct sound.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Opaque failure surfaced by the native layer, e.g. a rejected parameter.
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, AlSceneError>;
