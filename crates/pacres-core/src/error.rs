//! Error types for proxy resolution
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for proxy resolution operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the proxy resolution system
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Operation requested something the fetch client does not implement
    /// (e.g. retrieving a PAC file over HTTPS)
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Host name could not be resolved to an address
    #[error("Address resolution failed: {0}")]
    AddressResolution(String),

    /// TCP connection to the PAC origin failed
    #[error("Connect failed: {0}")]
    Connect(String),

    /// Request could not be written to the socket
    #[error("Send failed: {0}")]
    Send(String),

    /// Malformed or incomplete HTTP response headers
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Response body ended before the declared Content-Length
    #[error("Truncated response: expected {expected} bytes, received {received}")]
    Truncated {
        /// Bytes declared by the Content-Length header
        expected: usize,
        /// Bytes actually received before the peer closed the connection
        received: usize,
    },

    /// Declared body size exceeds the defensive allocation cap
    #[error("Out of memory: declared body of {0} bytes exceeds cap")]
    OutOfMemory(usize),

    /// No script-engine backend is bound, or binding one failed
    #[error("Script engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The PAC utility library or the user script threw an exception
    #[error("Script exception: {0}")]
    ScriptException(String),

    /// FindProxyForURL was missing, not callable, or returned a non-string
    #[error("Invalid script result: {0}")]
    InvalidResult(String),

    /// The resolution was cancelled before completing
    #[error("Resolution cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "unsupported" error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an address resolution error
    pub fn address_resolution(msg: impl Into<String>) -> Self {
        Self::AddressResolution(msg.into())
    }

    /// Create a connect error
    pub fn connect(msg: impl Into<String>) -> Self {
        Self::Connect(msg.into())
    }

    /// Create a send error
    pub fn send(msg: impl Into<String>) -> Self {
        Self::Send(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an engine-unavailable error
    pub fn engine_unavailable(msg: impl Into<String>) -> Self {
        Self::EngineUnavailable(msg.into())
    }

    /// Create a script exception error
    pub fn script_exception(msg: impl Into<String>) -> Self {
        Self::ScriptException(msg.into())
    }

    /// Create an invalid-result error
    pub fn invalid_result(msg: impl Into<String>) -> Self {
        Self::InvalidResult(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error is terminal for a whole resolution attempt
    /// rather than for a single cascade step
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
