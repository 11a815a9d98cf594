//! Scope engine error types

use thiserror::Error;

/// Failures surfaced by the engine's setup and configuration calls.
///
/// Malformed trigger data is never an error: it leaves the channel idle.
#[derive(Error, Debug)]
pub enum ScopeError {
    /// The tracking thread could not be created
    #[error("failed to spawn scope tracking thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    /// `start` was called on an engine whose tracker is still running
    #[error("scope tracking thread is already running")]
    AlreadyRunning,

    /// Channel counts must be even and within `2..=MAX_VOICES`
    #[error("invalid channel count {0}: expected an even number between 2 and 32")]
    InvalidChannelCount(usize),
}

/// Result type for scope engine operations
pub type ScopeResult<T> = Result<T, ScopeError>;
