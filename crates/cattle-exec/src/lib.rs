//! # cattle-exec
//!
//! Run a command inside containers managed by a Rancher/Cattle API and
//! stream the output back.
//!
//! A run has three stages per container:
//! - resolve: look the container up by ID, name or label and read its
//!   `actions.execute` URL
//! - negotiate: POST an exec request to that URL and receive a WebSocket
//!   URL plus a one-time token
//! - relay: attach to the WebSocket and copy base64-decoded frames to stdout
//!   until the remote end hangs up
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   GET /containers    ┌──────────────┐
//! │             │─────────────────────►│              │
//! │ cattle-exec │   POST ?action=exec  │  Cattle API  │
//! │             │─────────────────────►│              │
//! │             │◄═════════════════════│              │
//! └─────────────┘   WebSocket output   └──────────────┘
//! ```
//!
//! Targets are processed one after another. See [`orchestrator`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod exec;
pub mod invocation;
pub mod locator;
pub mod orchestrator;
pub mod output;
pub mod relay;
pub mod selector;

pub use cli::{Cli, Format};
pub use client::CattleClient;
pub use config::{ConnectionConfig, Timeouts};
pub use error::ExecError;
pub use exec::{ExecRequest, ExecSession};
pub use invocation::Invocation;
pub use orchestrator::{Orchestrator, RunReport};
pub use output::OutputFormat;
pub use selector::{ContainerSelector, LabelMatch};
