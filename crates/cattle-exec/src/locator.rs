//! Resolve selectors to container execute-action URLs.

use tracing::{debug, warn};

use crate::client::{CattleClient, ContainerRecord};
use crate::error::ExecError;
use crate::selector::{ContainerSelector, LabelMatch};

/// Resolves selectors against the container inventory.
#[derive(Debug, Clone)]
pub struct Locator<'a> {
    client: &'a CattleClient,
    label_match: LabelMatch,
}

impl<'a> Locator<'a> {
    /// Create a locator using substring label matching.
    #[must_use]
    pub const fn new(client: &'a CattleClient) -> Self {
        Self {
            client,
            label_match: LabelMatch::Substring,
        }
    }

    /// Set the label match mode.
    #[must_use]
    pub fn with_label_match(mut self, label_match: LabelMatch) -> Self {
        self.label_match = label_match;
        self
    }

    /// Resolve one selector to its execute URLs.
    ///
    /// ID and name selectors yield exactly one URL; label selectors yield
    /// every matching running container, in inventory order.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::ContainerNotFound`] if an ID or name lookup has no
    /// usable record, or any error from the inventory query.
    pub async fn locate(&self, selector: &ContainerSelector) -> Result<Vec<String>, ExecError> {
        let records = self.client.list_containers(selector).await?;

        match selector {
            ContainerSelector::ByLabel(label) => {
                let urls = match_labels(&records, label, self.label_match);
                debug!(label = %label, matched = urls.len(), scanned = records.len(), "label lookup");
                Ok(urls)
            }
            ContainerSelector::ById(_) | ContainerSelector::ByName(_) => {
                let url = records.first().and_then(ContainerRecord::execute_url).ok_or_else(|| {
                    let (filter, value) = selector.filter();
                    ExecError::ContainerNotFound {
                        filter,
                        value: value.to_string(),
                    }
                })?;
                debug!(%selector, execute_url = %url, "resolved container");
                Ok(vec![url.to_string()])
            }
        }
    }

    /// Resolve every selector and concatenate the results in order.
    ///
    /// Duplicates are kept.
    ///
    /// # Errors
    ///
    /// Returns the first error from any selector.
    pub async fn locate_all(
        &self,
        selectors: &[ContainerSelector],
    ) -> Result<Vec<String>, ExecError> {
        let mut urls = Vec::new();
        for selector in selectors {
            urls.extend(self.locate(selector).await?);
        }
        Ok(urls)
    }
}

/// Collect execute URLs of records whose labels match `label`.
///
/// Matching records without an execute action are skipped.
#[must_use]
pub fn match_labels(records: &[ContainerRecord], label: &str, mode: LabelMatch) -> Vec<String> {
    records
        .iter()
        .filter(|record| mode.matches(record.labels(), label))
        .filter_map(|record| {
            let url = record.execute_url();
            if url.is_none() {
                let id = record.id().unwrap_or("<unknown>");
                warn!(container = %id, "label match has no execute action, skipping");
            }
            url.map(ToString::to_string)
        })
        .collect()
}
