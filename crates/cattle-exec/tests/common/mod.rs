//! Shared test helpers: a mock exec WebSocket endpoint.

#![allow(dead_code)]

use std::net::SocketAddr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

/// Basic auth header for access key `key` and secret `secret`.
pub const BASIC_AUTH: &str = "Basic a2V5OnNlY3JldA==";

/// How the mock ends a session.
#[derive(Debug, Clone, Copy)]
pub enum Ending {
    /// Send a close frame.
    Close,
    /// Drop the TCP connection without a closing handshake.
    Drop,
}

/// Frames to send on one accepted connection.
#[derive(Debug, Clone)]
pub struct Session {
    /// Raw frame payloads, sent as text.
    pub frames: Vec<String>,
    /// How the session ends.
    pub ending: Ending,
}

impl Session {
    /// A session sending each chunk base64-encoded.
    pub fn output(chunks: &[&str], ending: Ending) -> Self {
        Self {
            frames: chunks.iter().map(|c| STANDARD.encode(c)).collect(),
            ending,
        }
    }

    /// A session sending raw, unencoded payloads.
    pub fn raw(frames: &[&str]) -> Self {
        Self {
            frames: frames.iter().map(|f| (*f).to_string()).collect(),
            ending: Ending::Close,
        }
    }
}

/// A mock exec WebSocket endpoint bound to an available port.
pub struct MockExecSocket {
    listener: TcpListener,
    addr: SocketAddr,
}

impl MockExecSocket {
    /// Bind to localhost.
    pub async fn bind() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    /// WebSocket URL to hand out in exec responses.
    pub fn url(&self) -> String {
        format!("ws://{}/v1/exec/", self.addr)
    }

    /// Exec response body pointing at this socket.
    pub fn exec_response(&self, token: &str) -> Value {
        json!({ "type": "hostAccess", "url": self.url(), "token": token })
    }

    /// Accept one connection per session, in order. Resolves to the request
    /// URIs seen, e.g. `/v1/exec/?token=tok-1`.
    pub fn serve(self, sessions: Vec<Session>) -> JoinHandle<Vec<String>> {
        tokio::spawn(async move {
            let mut seen = Vec::new();
            for session in sessions {
                let (stream, _) = self.listener.accept().await.expect("accept");
                let mut uri = String::new();
                let capture = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                    uri = req.uri().to_string();
                    Ok(resp)
                };
                let mut ws = accept_hdr_async(stream, capture).await.expect("handshake");
                seen.push(uri);

                for frame in session.frames {
                    ws.send(Message::Text(frame.into())).await.expect("send");
                }

                match session.ending {
                    Ending::Close => {
                        ws.close(None).await.expect("close");
                        while let Some(Ok(_)) = ws.next().await {}
                    }
                    Ending::Drop => drop(ws),
                }
            }
            seen
        })
    }

    /// Whether a connection arrives within `wait`.
    pub async fn connection_within(&self, wait: std::time::Duration) -> bool {
        tokio::time::timeout(wait, self.listener.accept()).await.is_ok()
    }
}

/// A container record as served by `/containers`.
pub fn container(base_url: &str, id: &str, labels: Value) -> Value {
    json!({
        "id": id,
        "type": "container",
        "state": "running",
        "labels": labels,
        "actions": {
            "execute": format!("{base_url}/v1/containers/{id}/?action=execute"),
        }
    })
}
