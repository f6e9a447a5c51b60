//! Exec output relay.
//!
//! Attaches to an exec session's WebSocket and copies its output to a
//! writer. Every frame carries base64-encoded TTY output; frames are decoded
//! and written one at a time with no reassembly, so line boundaries may fall
//! anywhere.
//!
//! The remote end signals completion by dropping the connection rather than
//! sending an end marker. Any read error, close frame or end of stream is
//! therefore the normal end of a session, not a failure.

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, trace};
use url::Url;

use crate::config::Timeouts;
use crate::error::ExecError;
use crate::exec::ExecSession;

/// Lifecycle of one relay attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Opening the WebSocket.
    Connecting,
    /// Copying frames to the writer.
    Streaming,
    /// Connection finished.
    Closed,
}

/// Counters for a finished relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Data frames received.
    pub frames: usize,
    /// Decoded bytes written.
    pub bytes: usize,
}

/// An error that ended a target, with the output copied before it.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct RelayError {
    /// Counters up to the failure.
    pub stats: RelayStats,
    /// What went wrong.
    #[source]
    pub source: ExecError,
}

impl From<ExecError> for RelayError {
    fn from(source: ExecError) -> Self {
        Self {
            stats: RelayStats::default(),
            source,
        }
    }
}

/// Streams exec session output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relay {
    timeouts: Timeouts,
}

impl Relay {
    /// Create a relay with the given deadlines.
    #[must_use]
    pub const fn new(timeouts: Timeouts) -> Self {
        Self { timeouts }
    }

    /// Attach to `session` and copy decoded output into `out` until the
    /// remote end closes.
    ///
    /// # Errors
    ///
    /// Returns a transport or timeout error if the connection cannot be
    /// opened, [`ExecError::Timeout`] if the stream stays silent past the
    /// idle limit, [`ExecError::Decode`] for a payload that is not base64,
    /// or [`ExecError::Io`] if writing fails. Errors after the connection
    /// opened carry the counters reached so far.
    pub async fn run<W: Write>(
        &self,
        session: &ExecSession,
        out: &mut W,
    ) -> Result<RelayStats, RelayError> {
        let url = tokenized_url(&session.websocket_url, &session.token)?;
        debug!(websocket_url = %session.websocket_url, state = ?RelayState::Connecting, "attaching to exec session");

        let (mut ws, _response) = timeout(self.timeouts.connect, connect_async(url.as_str()))
            .await
            .map_err(|_| ExecError::Timeout {
                operation: "websocket connect",
                after: self.timeouts.connect,
            })?
            .map_err(|e| ExecError::Transport(format!("websocket connect failed: {e}")))?;
        trace!(state = ?RelayState::Streaming, "websocket connected");

        let mut stats = RelayStats::default();
        match self.stream(&mut ws, out, &mut stats).await {
            Ok(()) => {
                debug!(frames = stats.frames, bytes = stats.bytes, "relay finished");
                Ok(stats)
            }
            Err(source) => {
                debug!(frames = stats.frames, bytes = stats.bytes, error = %source, "relay stopped");
                Err(RelayError { stats, source })
            }
        }
    }

    async fn stream<S, W>(
        &self,
        ws: &mut S,
        out: &mut W,
        stats: &mut RelayStats,
    ) -> Result<(), ExecError>
    where
        S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
        W: Write,
    {
        let mut state = RelayState::Streaming;
        while state == RelayState::Streaming {
            let next = match self.timeouts.idle_read {
                Some(limit) => timeout(limit, ws.next())
                    .await
                    .map_err(|_| ExecError::Timeout {
                        operation: "websocket read",
                        after: limit,
                    })?,
                None => ws.next().await,
            };

            match next {
                Some(Ok(Message::Text(text))) => {
                    stats.bytes += emit(text.as_bytes(), out)?;
                    stats.frames += 1;
                }
                Some(Ok(Message::Binary(data))) => {
                    stats.bytes += emit(&data, out)?;
                    stats.frames += 1;
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "exec session closed by remote");
                    state = RelayState::Closed;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    info!(reason = %e, "exec session ended");
                    state = RelayState::Closed;
                }
                None => {
                    info!("exec session stream ended");
                    state = RelayState::Closed;
                }
            }
        }
        Ok(())
    }
}

/// Append the session token to a WebSocket URL as `token=...`.
///
/// # Errors
///
/// Returns [`ExecError::Protocol`] if the URL cannot be parsed.
pub fn tokenized_url(websocket_url: &str, token: &str) -> Result<Url, ExecError> {
    let mut url = Url::parse(websocket_url)
        .map_err(|e| ExecError::Protocol(format!("invalid websocket URL '{websocket_url}': {e}")))?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

/// Decode one frame payload.
///
/// # Errors
///
/// Returns [`ExecError::Decode`] if the payload is not standard base64.
pub fn decode_frame(payload: &[u8]) -> Result<Vec<u8>, ExecError> {
    Ok(STANDARD.decode(payload)?)
}

fn emit<W: Write>(payload: &[u8], out: &mut W) -> Result<usize, ExecError> {
    let decoded = decode_frame(payload)?;
    out.write_all(&decoded)?;
    out.flush()?;
    Ok(decoded.len())
}
