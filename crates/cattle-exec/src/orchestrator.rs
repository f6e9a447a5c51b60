//! Run a command across every selected container.
//!
//! ```text
//! Invocation ──► Locator ──► [execute URL ...]
//!                               │ (one at a time)
//!                               ▼
//!                         negotiate ──► Relay ──► stdout
//! ```
//!
//! Resolution happens up front and any failure there aborts the run before a
//! session is opened. After that each target is independent: a failed
//! negotiation or relay is recorded and the next target is attempted.

use std::io::Write;

use tracing::{info, warn};

use crate::client::CattleClient;
use crate::config::ConnectionConfig;
use crate::error::ExecError;
use crate::exec::negotiate;
use crate::invocation::Invocation;
use crate::locator::Locator;
use crate::relay::{Relay, RelayError, RelayStats};

/// Result of running the command on one container.
#[derive(Debug)]
pub struct TargetOutcome {
    /// Execute-action URL of the container.
    pub execute_url: String,
    /// Relay counters; partial when the target failed midway.
    pub stats: RelayStats,
    /// The error that stopped this target.
    pub error: Option<ExecError>,
}

impl TargetOutcome {
    /// Whether this target completed.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Command that was run.
    pub command: String,
    /// One entry per resolved target, in execution order.
    pub targets: Vec<TargetOutcome>,
}

impl RunReport {
    /// Number of targets that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.targets.iter().filter(|t| !t.succeeded()).count()
    }

    /// True when no target failed. A run with no targets counts as success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Drives resolve → negotiate → relay for one invocation.
#[derive(Debug)]
pub struct Orchestrator {
    invocation: Invocation,
    client: CattleClient,
}

impl Orchestrator {
    /// Create an orchestrator for a validated invocation.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Transport`] if the HTTP client cannot be built.
    pub fn new(invocation: Invocation, config: ConnectionConfig) -> Result<Self, ExecError> {
        let client = CattleClient::new(config, invocation.timeouts())?;
        Ok(Self { invocation, client })
    }

    /// The invocation being run.
    #[must_use]
    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Resolve all selectors to execute URLs, label matches first.
    ///
    /// # Errors
    ///
    /// Returns the first resolution error.
    pub async fn resolve_targets(&self) -> Result<Vec<String>, ExecError> {
        Locator::new(&self.client)
            .with_label_match(self.invocation.label_match())
            .locate_all(self.invocation.selectors())
            .await
    }

    /// Run the command on one target, writing progress and output to `out`.
    ///
    /// # Errors
    ///
    /// Returns any negotiation, relay or write error for this target, with
    /// the output counters reached before it.
    pub async fn run_target<W: Write>(
        &self,
        execute_url: &str,
        out: &mut W,
    ) -> Result<RelayStats, RelayError> {
        writeln!(
            out,
            "Executing [{}] on container [{execute_url}]",
            self.invocation.command()
        )
        .and_then(|()| out.flush())
        .map_err(ExecError::from)?;

        let session = negotiate(&self.client, execute_url, self.invocation.command()).await?;
        Relay::new(self.invocation.timeouts())
            .run(&session, out)
            .await
    }

    /// Resolve targets and run the command on each, strictly in sequence.
    ///
    /// # Errors
    ///
    /// Returns an error only if target resolution fails. Per-target failures
    /// are recorded in the report.
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<RunReport, ExecError> {
        let targets = self.resolve_targets().await?;
        if targets.is_empty() {
            warn!(selectors = ?self.invocation.selectors(), "no containers matched");
        }

        let mut report = RunReport {
            command: self.invocation.command().to_string(),
            targets: Vec::with_capacity(targets.len()),
        };

        for execute_url in targets {
            let (stats, error) = match self.run_target(&execute_url, out).await {
                Ok(stats) => {
                    info!(
                        target = %execute_url,
                        frames = stats.frames,
                        bytes = stats.bytes,
                        "target finished"
                    );
                    (stats, None)
                }
                Err(RelayError { stats, source }) => {
                    warn!(
                        target = %execute_url,
                        error = %source,
                        frames = stats.frames,
                        "target failed, continuing"
                    );
                    (stats, Some(source))
                }
            };
            report.targets.push(TargetOutcome {
                execute_url,
                stats,
                error,
            });
        }

        Ok(report)
    }
}
