//! Error types for nextmonth-core

use thiserror::Error;

/// Terminal engine error type
#[derive(Debug, Error)]
pub enum Error {
    /// The shell process could not be started
    #[error("failed to spawn shell: {0}")]
    Spawn(String),

    /// Write to the stdin of a process that has exited
    #[error("broken pipe: process has exited")]
    BrokenPipe,

    /// Unknown or stale session
    #[error("session not found: {0}")]
    NotFound(String),

    /// A transport is already bound to the session
    #[error("session already attached: {0}")]
    AlreadyAttached(String),

    /// Undecodable transport payload
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Message could not be encoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Audit store failure
    #[error("audit store error: {0}")]
    Audit(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a transport attach should be refused (the session cannot be
    /// driven by this connection).
    #[must_use]
    pub fn is_attach_refusal(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::AlreadyAttached(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
