//! Error types for ambient-loop
//!
//! Internal engine operations return these; the public engine surface
//! converts them into log lines and diagnostic events instead of
//! propagating them to the caller.

use crate::player::PlayerError;
use ambient_common::events::DiagnosticKind;
use thiserror::Error;

/// Main error type for the loop engine and its service
#[derive(Error, Debug)]
pub enum Error {
    /// Sound name not present in the catalog
    #[error("Unknown sound: {0}")]
    UnknownSound(String),

    /// Players not initialized (or already disposed)
    #[error("Player not ready: {0}")]
    PlayerNotReady(String),

    /// An underlying player call failed
    #[error("Playback failure: {0}")]
    PlaybackFailure(String),

    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Diagnostic category reported on the event bus
    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            Error::UnknownSound(_) => DiagnosticKind::UnknownSound,
            Error::PlayerNotReady(_) => DiagnosticKind::PlayerNotReady,
            _ => DiagnosticKind::PlaybackFailure,
        }
    }
}

impl From<PlayerError> for Error {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::NotReady(msg) => Error::PlayerNotReady(msg),
            PlayerError::Failure(msg) => Error::PlaybackFailure(msg),
        }
    }
}

impl From<ambient_common::Error> for Error {
    fn from(err: ambient_common::Error) -> Self {
        match err {
            ambient_common::Error::Io(e) => Error::Io(e),
            other => Error::Config(other.to_string()),
        }
    }
}

/// Convenience Result type using ambient-loop Error
pub type Result<T> = std::result::Result<T, Error>;
