//! Error and notice types.

use thiserror::Error;

/// Failures that abort the current operation.
#[derive(Debug, Error)]
pub enum VisualizerError {
    /// A frame from the analysis source does not match the history buffer's frame length.
    #[error("frame size mismatch: expected {expected} samples, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Recoverable, user-facing conditions. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserNotice {
    #[error("no playback source available, load an audio file first")]
    NoSource,

    #[error("playback has not been started yet")]
    NotStarted,

    #[error("playback is already started")]
    AlreadyStarted,

    #[error("the playback transport is closed")]
    TransportClosed,

    #[error("unsupported file type: {0} (please choose an audio file)")]
    UnsupportedFileType(String),
}
