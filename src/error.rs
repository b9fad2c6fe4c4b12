//! Error types for Plinth.
//!
//! Every fault the window manager can observe is classified here so the
//! dispatch loop can decide between absorbing it, shutting down cleanly, or
//! giving up.

use thiserror::Error;
use x11rb::errors::{ConnectionError, ReplyError, ReplyOrIdError};

/// Top-level error for the window manager.
#[derive(Debug, Error)]
pub enum WmError {
    /// A precondition for running was not met.
    #[error(transparent)]
    Startup(#[from] StartupError),

    /// A protocol request or reply failed.
    #[error("X protocol error: {0}")]
    Protocol(String),

    /// Launching a program failed before it was detached.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// An event handler panicked.
    #[error("handler panicked: {0}")]
    HandlerPanic(String),

    /// Clean termination was requested.
    #[error("{0}")]
    Shutdown(Shutdown),

    /// Too many recoverable faults.
    #[error("giving up after {faults} faults, last: {last}")]
    RuntimeFatal { faults: u32, last: Box<WmError> },
}

/// Startup preconditions.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to connect to X server: {0}")]
    Connect(String),

    #[error("failed to acquire screens: {0}")]
    Acquire(String),

    #[error("no unmanaged screens found")]
    NoManagedScreens,
}

impl StartupError {
    /// Reclassify a failure that happened before the event loop started
    pub fn during_startup(err: WmError) -> WmError {
        match err {
            WmError::Startup(_) => err,
            other => Self::Acquire(other.to_string()).into(),
        }
    }
}

/// Failures observable by the caller of a detached launch.
///
/// Anything that goes wrong after the first fork happens in a process the
/// caller no longer tracks and is only logged there.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("empty command")]
    EmptyCommand,

    #[error("argument or environment contains a NUL byte: {0:?}")]
    NulByte(String),

    #[error("fork failed: {0}")]
    Fork(#[source] nix::Error),
}

/// Why the dispatch loop stopped without a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// SIGINT or SIGTERM.
    Interrupted,
    /// The server closed the display connection.
    ConnectionClosed,
}

impl std::fmt::Display for Shutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interrupted => write!(f, "interrupted"),
            Self::ConnectionClosed => write!(f, "display connection closed by server"),
        }
    }
}

impl WmError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Shutdown(_) => 0,
            Self::Startup(_) => 2,
            Self::RuntimeFatal { .. } => 1,
            Self::Protocol(_) | Self::Spawn(_) | Self::HandlerPanic(_) => 1,
        }
    }
}

impl From<ConnectionError> for WmError {
    fn from(err: ConnectionError) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<ReplyError> for WmError {
    fn from(err: ReplyError) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<ReplyOrIdError> for WmError {
    fn from(err: ReplyOrIdError) -> Self {
        Self::Protocol(err.to_string())
    }
}
