//! Container selectors and label matching.

use std::fmt;

use clap::ValueEnum;
use serde_json::value::RawValue;
use serde_json::{Map, Value};

/// Criterion used to resolve target containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerSelector {
    /// Match on the container's external ID prefix.
    ById(String),
    /// Match on the container name.
    ByName(String),
    /// Match running containers whose labels contain the given text.
    ByLabel(String),
}

impl ContainerSelector {
    /// Query filter name and value used against `/containers`.
    #[must_use]
    pub fn filter(&self) -> (&'static str, &str) {
        match self {
            Self::ById(id) => ("externalId_prefix", id),
            Self::ByName(name) => ("name", name),
            Self::ByLabel(_) => ("state", "running"),
        }
    }

    /// Whether this selector can resolve to more than one container.
    #[must_use]
    pub const fn fans_out(&self) -> bool {
        matches!(self, Self::ByLabel(_))
    }
}

impl fmt::Display for ContainerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(id) => write!(f, "id={id}"),
            Self::ByName(name) => write!(f, "name={name}"),
            Self::ByLabel(label) => write!(f, "label~{label}"),
        }
    }
}

/// How a label selector is compared against a container's labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LabelMatch {
    /// Substring search over the label document as the server sent it.
    ///
    /// Loose on purpose: selector `oo` matches a label value `foo`, and a
    /// selector may straddle a key and its value.
    #[default]
    Substring,
    /// `key=value` compared against individual label entries; a selector
    /// without `=` matches on key presence.
    KeyValue,
}

impl LabelMatch {
    /// Check whether a container record's `labels` field satisfies `selector`.
    #[must_use]
    pub fn matches(self, labels: Option<&RawValue>, selector: &str) -> bool {
        let Some(labels) = labels else {
            return false;
        };
        match self {
            Self::Substring => render_labels(labels).contains(selector),
            Self::KeyValue => {
                let Ok(map) = serde_json::from_str::<Map<String, Value>>(labels.get()) else {
                    return false;
                };
                match selector.split_once('=') {
                    Some((key, expected)) => map
                        .get(key)
                        .is_some_and(|v| label_value_text(v) == expected),
                    None => map.contains_key(selector),
                }
            }
        }
    }
}

/// The raw text a substring selector is matched against.
///
/// Objects keep their original key order and spacing; a string value is
/// searched without its surrounding quotes, escapes left as sent.
#[must_use]
pub fn render_labels(labels: &RawValue) -> &str {
    let raw = labels.get();
    raw.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(raw)
}

fn label_value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
