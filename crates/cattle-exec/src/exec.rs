//! Exec session negotiation.
//!
//! POSTing an [`ExecRequest`] to a container's execute action allocates a
//! remote TTY session and returns the WebSocket URL and one-time token used
//! to attach to it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::CattleClient;
use crate::error::ExecError;

/// Body of an execute-action POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecRequest {
    /// Attach the session's stdin.
    pub attach_stdin: bool,
    /// Attach the session's stdout.
    pub attach_stdout: bool,
    /// Command tokens.
    pub command: Vec<String>,
    /// Allocate a pseudo-terminal.
    pub tty: bool,
}

impl ExecRequest {
    /// Build an interactive TTY request for a command line.
    ///
    /// The command line is split on whitespace only; quotes are not
    /// interpreted, so `echo "a b"` becomes `["echo", "\"a", "b\""]`.
    #[must_use]
    pub fn from_command_line(command_line: &str) -> Self {
        Self {
            attach_stdin: true,
            attach_stdout: true,
            command: command_line.split_whitespace().map(ToString::to_string).collect(),
            tty: true,
        }
    }
}

/// Attach details for one allocated session. Single use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecSession {
    /// WebSocket endpoint.
    pub websocket_url: String,
    /// One-time authorization token.
    pub token: String,
}

impl ExecSession {
    /// Extract `url` and `token` from an execute-action reply.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Protocol`] if either field is missing or not a
    /// string.
    pub fn from_response(body: &Value) -> Result<Self, ExecError> {
        let field = |name: &str| {
            body.get(name)
                .and_then(Value::as_str)
                .map(ToString::to_string)
                .ok_or_else(|| {
                    ExecError::Protocol(format!("exec response is missing '{name}'"))
                })
        };

        Ok(Self {
            websocket_url: field("url")?,
            token: field("token")?,
        })
    }
}

/// Request a new exec session for `command_line` on one container.
///
/// Each call allocates a fresh session; nothing is cached.
///
/// # Errors
///
/// Returns a transport or timeout error if the POST fails, or
/// [`ExecError::Protocol`] if the reply lacks `url` or `token`.
pub async fn negotiate(
    client: &CattleClient,
    execute_url: &str,
    command_line: &str,
) -> Result<ExecSession, ExecError> {
    let request = ExecRequest::from_command_line(command_line);
    debug!(
        execute_url = %execute_url,
        command = ?request.command,
        "requesting exec session"
    );

    let body = client.post_action(execute_url, &request).await?;
    let session = ExecSession::from_response(&body)?;
    debug!(websocket_url = %session.websocket_url, "exec session allocated");
    Ok(session)
}
