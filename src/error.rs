//! Error types for awsop command binding and dispatch.
//!
//! `ShimError` covers everything that stops an invocation locally, before or
//! around the remote call. Faults reported by the remote service are
//! `ServiceFault`s (see `client`) and surface as error records, not as
//! `ShimError`s.

use thiserror::Error;

/// Main error type for awsop operations
#[derive(Error, Debug)]
pub enum ShimError {
    /// Bad parameter, selector, or flag combination for a command.
    /// Raised before any request is sent.
    #[error("argument error for '{0}': {1}")]
    Argument(String, String),

    /// No operation is registered under this command name
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Two descriptors claim the same command name
    #[error("duplicate command name: {0}")]
    DuplicateCommand(String),

    /// Invalid configuration for a named section
    #[error("invalid config for '{0}': {1}")]
    InvalidConfig(String, String),

    /// Invocation stopped by the cancellation token
    #[error("invocation of '{0}' cancelled")]
    Cancelled(String),

    /// MCP protocol-level problem (bad tool name, unencodable content)
    #[error("protocol error for '{0}': {1}")]
    Protocol(String, String),
}

impl ShimError {
    /// Shorthand for an argument error on `command`.
    pub fn argument(command: &str, msg: impl Into<String>) -> Self {
        ShimError::Argument(command.to_string(), msg.into())
    }
}

/// Result type alias for awsop operations
pub type Result<T> = std::result::Result<T, ShimError>;
