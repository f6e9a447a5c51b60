//! Command-line argument parsing with clap.

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_IDLE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, Timeouts,
};
use crate::error::ExecError;
use crate::invocation::Invocation;
use crate::selector::LabelMatch;

/// Shown after the flag list in `--help`.
const FLAG_SPELLING: &str = "Long flags take two dashes: --id, --name, --label, --cmd.\n\
                             Single-dash forms such as -name are rejected.";

/// Run a command in Cattle-managed containers and stream its output.
///
/// Credentials are read from `CATTLE_URL`, `CATTLE_ACCESS_KEY` and
/// `CATTLE_SECRET_KEY`.
#[derive(Parser, Debug, Clone)]
#[command(name = "cattle-exec")]
#[command(version, about, long_about = None, disable_version_flag = true)]
#[command(after_help = FLAG_SPELLING)]
pub struct Cli {
    /// Container external ID (prefix match).
    #[arg(long)]
    pub id: Option<String>,

    /// Container name.
    #[arg(long)]
    pub name: Option<String>,

    /// Text to look for in running containers' labels.
    #[arg(long)]
    pub label: Option<String>,

    /// Command line to execute, split on whitespace.
    #[arg(long)]
    pub cmd: Option<String>,

    /// How --label is compared against container labels.
    #[arg(long, value_enum, default_value_t = LabelMatch::Substring)]
    pub label_match: LabelMatch,

    /// Enable verbose protocol logging.
    #[arg(long)]
    pub debug: bool,

    /// Format of the end-of-run summary written to stderr.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Connect timeout in seconds.
    #[arg(long, env = "CATTLE_EXEC_CONNECT_TIMEOUT", default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs())]
    pub connect_timeout: u64,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "CATTLE_EXEC_REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub request_timeout: u64,

    /// Longest silence tolerated on the output stream, in seconds (0 = no limit).
    #[arg(long, env = "CATTLE_EXEC_IDLE_TIMEOUT", default_value_t = DEFAULT_IDLE_TIMEOUT.as_secs())]
    pub idle_timeout: u64,

    /// Print version.
    #[arg(short = 'v', long, action = ArgAction::Version)]
    pub version: Option<bool>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Validate arguments into an [`Invocation`].
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::CommandMissing`], [`ExecError::SelectorMissing`]
    /// or [`ExecError::Config`] for a zero timeout.
    pub fn invocation(&self) -> Result<Invocation, ExecError> {
        let timeouts =
            Timeouts::from_secs(self.connect_timeout, self.request_timeout, self.idle_timeout)?;

        Ok(Invocation::new(
            self.cmd.as_deref(),
            self.id.as_deref(),
            self.name.as_deref(),
            self.label.as_deref(),
        )?
        .with_label_match(self.label_match)
        .with_timeouts(timeouts))
    }

    /// Default tracing filter for the chosen verbosity.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        if self.debug {
            "cattle_exec=debug"
        } else {
            "cattle_exec=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::ContainerSelector;
    use clap::CommandFactory;

    #[test]
    fn help_names_double_dash_flags() {
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("Long flags take two dashes: --id, --name, --label, --cmd."));
        assert!(help.contains("Single-dash forms such as -name are rejected."));
    }

    #[test]
    fn single_dash_long_flag_is_rejected() {
        assert!(Cli::try_parse_from(["cattle-exec", "-name", "web-1", "--cmd", "ls"]).is_err());
    }

    #[test]
    fn parses_selectors_and_command() {
        let cli = Cli::parse_from([
            "cattle-exec",
            "--name",
            "web-1",
            "--label",
            "tier",
            "--cmd",
            "ls -la /tmp",
        ]);
        let inv = cli.invocation().expect("valid");
        assert_eq!(inv.command(), "ls -la /tmp");
        assert_eq!(
            inv.selectors(),
            &[
                ContainerSelector::ByLabel("tier".into()),
                ContainerSelector::ByName("web-1".into()),
            ]
        );
    }

    #[test]
    fn missing_command_is_rejected() {
        let cli = Cli::parse_from(["cattle-exec", "--id", "abc123"]);
        assert!(matches!(cli.invocation(), Err(ExecError::CommandMissing)));
    }

    #[test]
    fn missing_selector_is_rejected() {
        let cli = Cli::parse_from(["cattle-exec", "--cmd", "ls"]);
        assert!(matches!(cli.invocation(), Err(ExecError::SelectorMissing)));
    }

    #[test]
    fn debug_flag_raises_log_level() {
        let cli = Cli::parse_from(["cattle-exec", "--debug"]);
        assert_eq!(cli.log_filter(), "cattle_exec=debug");
        let cli = Cli::parse_from(["cattle-exec"]);
        assert_eq!(cli.log_filter(), "cattle_exec=info");
    }

    #[test]
    fn label_match_and_format_flags() {
        let cli = Cli::parse_from([
            "cattle-exec",
            "--label-match",
            "key-value",
            "--format",
            "json",
        ]);
        assert_eq!(cli.label_match, LabelMatch::KeyValue);
        assert_eq!(cli.format, Format::Json);
    }

    #[test]
    fn idle_timeout_zero_disables_limit() {
        let cli = Cli::parse_from([
            "cattle-exec",
            "--id",
            "abc",
            "--cmd",
            "sleep 600",
            "--idle-timeout",
            "0",
        ]);
        let inv = cli.invocation().expect("valid");
        assert_eq!(inv.timeouts().idle_read, None);
    }

    #[test]
    fn version_flag_is_short_v() {
        let err = Cli::try_parse_from(["cattle-exec", "-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
