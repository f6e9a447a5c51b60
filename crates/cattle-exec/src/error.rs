//! Error types for cattle-exec.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while resolving, negotiating or relaying an exec session.
#[derive(Debug, Error)]
pub enum ExecError {
    /// A required environment variable is absent or empty.
    #[error("required environment variable not set: {0}")]
    ConfigMissing(&'static str),

    /// No container selector was supplied.
    #[error("missing container selector: one of --id, --name or --label is required")]
    SelectorMissing,

    /// No command was supplied.
    #[error("missing command: --cmd is required")]
    CommandMissing,

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP or WebSocket connection failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// A network operation exceeded its deadline.
    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        /// What was being waited on.
        operation: &'static str,
        /// The configured limit.
        after: Duration,
    },

    /// The API answered with a document missing an expected field.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A lookup by ID or name matched nothing usable.
    #[error("container not found or lacks an execute action: {filter}={value}")]
    ContainerNotFound {
        /// Query filter used.
        filter: &'static str,
        /// Value searched for.
        value: String,
    },

    /// A WebSocket payload was not valid base64.
    #[error("decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// IO error while writing output.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecError {
    /// Whether this error is raised before any network activity starts.
    ///
    /// Pre-flight errors abort the whole run; everything else is scoped to
    /// a single target.
    #[must_use]
    pub const fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::ConfigMissing(_) | Self::SelectorMissing | Self::CommandMissing | Self::Config(_)
        )
    }
}
