//! End-of-run summary rendering.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;

use crate::cli::Format;
use crate::error::ExecError;
use crate::orchestrator::RunReport;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), ExecError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| ExecError::Io(e.into()))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), ExecError>;
}

/// Per-target line of the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct TargetSummary {
    /// Execute-action URL.
    pub target: String,
    /// `ok` or `failed`.
    pub status: &'static str,
    /// Frames relayed.
    pub frames: usize,
    /// Decoded bytes written.
    pub bytes: usize,
    /// Error message for failed targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Command that was run.
    pub command: String,
    /// Targets that completed.
    pub succeeded: usize,
    /// Targets that failed.
    pub failed: usize,
    /// Per-target results.
    pub targets: Vec<TargetSummary>,
}

impl From<&RunReport> for RunSummary {
    fn from(report: &RunReport) -> Self {
        let targets: Vec<TargetSummary> = report
            .targets
            .iter()
            .map(|t| TargetSummary {
                target: t.execute_url.clone(),
                status: if t.succeeded() { "ok" } else { "failed" },
                frames: t.stats.frames,
                bytes: t.stats.bytes,
                error: t.error.as_ref().map(ToString::to_string),
            })
            .collect();
        let failed = report.failed();

        Self {
            command: report.command.clone(),
            succeeded: targets.len() - failed,
            failed,
            targets,
        }
    }
}

impl TableDisplay for RunSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), ExecError> {
        if self.targets.is_empty() {
            writeln!(writer, "No containers matched")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<56}  {:<6}  {:>6}  {:>10}",
            "TARGET", "STATUS", "FRAMES", "BYTES"
        )?;
        writeln!(writer, "{}", "─".repeat(84))?;

        for t in &self.targets {
            writeln!(
                writer,
                "{:<56}  {:<6}  {:>6}  {:>10}",
                truncate(&t.target, 56),
                t.status,
                t.frames,
                t.bytes
            )?;
            if let Some(ref err) = t.error {
                writeln!(writer, "  error: {err}")?;
            }
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "[{}] {} succeeded, {} failed",
            self.command, self.succeeded, self.failed
        )?;
        Ok(())
    }
}

/// Truncate a string to a maximum length, keeping the tail.
///
/// Execute URLs differ in their container ID near the end, so the head is
/// what gets dropped.
fn truncate(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let tail: String = s.chars().skip(len - (max_len - 3)).collect();
        format!("...{tail}")
    } else {
        s.chars().skip(len - max_len).collect()
    }
}
