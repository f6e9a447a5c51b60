//! Validated, immutable description of one run.

use crate::config::Timeouts;
use crate::error::ExecError;
use crate::selector::{ContainerSelector, LabelMatch};

/// Everything the orchestrator needs from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    command: String,
    selectors: Vec<ContainerSelector>,
    label_match: LabelMatch,
    timeouts: Timeouts,
}

impl Invocation {
    /// Validate raw selector and command inputs.
    ///
    /// Blank values count as absent. Selectors are stored in evaluation
    /// order: label first, then ID, then name.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::CommandMissing`] or [`ExecError::SelectorMissing`].
    pub fn new(
        command: Option<&str>,
        id: Option<&str>,
        name: Option<&str>,
        label: Option<&str>,
    ) -> Result<Self, ExecError> {
        let present = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToString::to_string)
        };

        let command = present(command).ok_or(ExecError::CommandMissing)?;

        let selectors: Vec<ContainerSelector> = [
            present(label).map(ContainerSelector::ByLabel),
            present(id).map(ContainerSelector::ById),
            present(name).map(ContainerSelector::ByName),
        ]
        .into_iter()
        .flatten()
        .collect();

        if selectors.is_empty() {
            return Err(ExecError::SelectorMissing);
        }

        Ok(Self {
            command,
            selectors,
            label_match: LabelMatch::default(),
            timeouts: Timeouts::default(),
        })
    }

    /// Set the label match mode.
    #[must_use]
    pub fn with_label_match(mut self, label_match: LabelMatch) -> Self {
        self.label_match = label_match;
        self
    }

    /// Set network timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// The command line to run in each container.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Active selectors, in evaluation order.
    #[must_use]
    pub fn selectors(&self) -> &[ContainerSelector] {
        &self.selectors
    }

    /// Label match mode.
    #[must_use]
    pub const fn label_match(&self) -> LabelMatch {
        self.label_match
    }

    /// Network timeouts.
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        self.timeouts
    }
}
