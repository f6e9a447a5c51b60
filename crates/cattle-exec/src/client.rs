//! HTTP client for the Cattle container API.
//!
//! Every request carries HTTP Basic credentials from [`ConnectionConfig`] and
//! is bounded by the connect and request deadlines in [`Timeouts`]. Inventory
//! records keep their `labels` text exactly as the server sent it.
//!
//! # Example
//!
//! ```rust,no_run
//! use cattle_exec::client::CattleClient;
//! use cattle_exec::config::{ConnectionConfig, Timeouts};
//! use cattle_exec::selector::ContainerSelector;
//!
//! # async fn example() -> Result<(), cattle_exec::ExecError> {
//! let config = ConnectionConfig::from_env()?;
//! let client = CattleClient::new(config, Timeouts::default())?;
//! let records = client
//!     .list_containers(&ContainerSelector::ByName("web-1".into()))
//!     .await?;
//! println!("{} record(s)", records.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;
use tracing::{debug, trace};

use crate::config::{ConnectionConfig, Timeouts};
use crate::error::ExecError;
use crate::selector::ContainerSelector;

/// One entry of a container query's `data` array.
#[derive(Debug, Deserialize)]
pub struct ContainerRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    labels: Option<Box<RawValue>>,
    #[serde(default)]
    actions: Option<Value>,
}

impl ContainerRecord {
    /// Container ID, when the server sent a string.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_ref().and_then(Value::as_str)
    }

    /// The `labels` field as served, or `None` when absent or null.
    #[must_use]
    pub fn labels(&self) -> Option<&RawValue> {
        self.labels.as_deref()
    }

    /// The `actions.execute` URL.
    #[must_use]
    pub fn execute_url(&self) -> Option<&str> {
        self.actions
            .as_ref()
            .and_then(|actions| actions.get("execute"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct ContainerCollection {
    data: Vec<ContainerRecord>,
}

/// Authenticated client for the container inventory and exec endpoints.
#[derive(Debug, Clone)]
pub struct CattleClient {
    http: reqwest::Client,
    config: ConnectionConfig,
    timeouts: Timeouts,
}

impl CattleClient {
    /// Create a client with the given credentials and deadlines.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Transport`] if the HTTP stack cannot be set up.
    pub fn new(config: ConnectionConfig, timeouts: Timeouts) -> Result<Self, ExecError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .user_agent(concat!("cattle-exec/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExecError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            timeouts,
        })
    }

    /// Connection settings in use.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Deadlines in use.
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Inventory query URL for a selector: `{base}/containers?{filter}={value}`.
    #[must_use]
    pub fn containers_url(&self, selector: &ContainerSelector) -> String {
        let (filter, value) = selector.filter();
        let value: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
        format!("{}/containers?{filter}={value}", self.config.base_url())
    }

    /// Fetch the `data` array of the inventory query for `selector`.
    ///
    /// # Errors
    ///
    /// Returns a transport or timeout error if the request fails, or
    /// [`ExecError::Protocol`] if the response has no `data` array.
    pub async fn list_containers(
        &self,
        selector: &ContainerSelector,
    ) -> Result<Vec<ContainerRecord>, ExecError> {
        let endpoint = self.containers_url(selector);
        debug!(endpoint = %endpoint, "querying containers");

        let response = self
            .http
            .get(&endpoint)
            .basic_auth(self.config.access_key(), Some(self.config.secret_key()))
            .send()
            .await
            .map_err(|e| self.request_error("container query", &e))?;

        let collection: ContainerCollection = self.read_json(response, "container query").await?;
        trace!(count = collection.data.len(), "container query returned");
        Ok(collection.data)
    }

    /// POST a JSON body to an action URL and return the JSON reply.
    ///
    /// # Errors
    ///
    /// Returns a transport or timeout error if the request fails.
    pub async fn post_action<T>(&self, action_url: &str, body: &T) -> Result<Value, ExecError>
    where
        T: Serialize + ?Sized,
    {
        let response = self
            .http
            .post(action_url)
            .basic_auth(self.config.access_key(), Some(self.config.secret_key()))
            .json(body)
            .send()
            .await
            .map_err(|e| self.request_error("exec request", &e))?;

        self.read_json(response, "exec request").await
    }

    /// Read a response body as JSON into `T`.
    ///
    /// A non-2xx status is only a transport failure when the body is not
    /// JSON; API error documents are decoded so the missing field is
    /// reported instead.
    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<T, ExecError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.request_error(operation, &e))?;

        if !status.is_success() {
            if serde_json::from_str::<Value>(&text).is_err() {
                return Err(ExecError::Transport(format!(
                    "{operation} failed with HTTP {status}"
                )));
            }
            debug!(%status, operation, "API returned an error document");
        }

        serde_json::from_str(&text)
            .map_err(|e| ExecError::Protocol(format!("{operation} returned unexpected JSON: {e}")))
    }

    fn request_error(&self, operation: &'static str, err: &reqwest::Error) -> ExecError {
        if err.is_timeout() {
            ExecError::Timeout {
                operation,
                after: self.timeout_limit(err.is_connect()),
            }
        } else {
            ExecError::Transport(format!("{operation} failed: {err}"))
        }
    }

    /// Deadline that applies to a failed request phase.
    const fn timeout_limit(&self, connecting: bool) -> Duration {
        if connecting {
            self.timeouts.connect
        } else {
            self.timeouts.request
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> CattleClient {
        CattleClient::new(ConnectionConfig::new(base, "key", "secret"), Timeouts::default())
            .expect("client should build")
    }

    #[test]
    fn containers_url_by_id() {
        let c = client("http://rancher:8080/v1");
        assert_eq!(
            c.containers_url(&ContainerSelector::ById("abc123".into())),
            "http://rancher:8080/v1/containers?externalId_prefix=abc123"
        );
    }

    #[test]
    fn containers_url_by_name() {
        let c = client("http://rancher:8080/v1/");
        assert_eq!(
            c.containers_url(&ContainerSelector::ByName("web-1".into())),
            "http://rancher:8080/v1/containers?name=web-1"
        );
    }

    #[test]
    fn containers_url_by_label_lists_running() {
        let c = client("http://rancher:8080/v1");
        assert_eq!(
            c.containers_url(&ContainerSelector::ByLabel("web".into())),
            "http://rancher:8080/v1/containers?state=running"
        );
    }

    #[test]
    fn connect_phase_timeout_reports_connect_limit() {
        let timeouts = Timeouts::from_secs(3, 20, 0).expect("valid timeouts");
        let c = CattleClient::new(ConnectionConfig::new("http://rancher/v1", "key", "secret"), timeouts)
            .expect("client should build");
        assert_eq!(c.timeout_limit(true), Duration::from_secs(3));
        assert_eq!(c.timeout_limit(false), Duration::from_secs(20));
    }

    #[test]
    fn collection_keeps_label_text_verbatim() {
        let body = r#"{"data":[{"id":"1i1","labels":{"tier": "web","app": "api"},"actions":{"execute":"http://rancher/x"}}]}"#;
        let collection: ContainerCollection = serde_json::from_str(body).expect("parse");
        let record = &collection.data[0];
        assert_eq!(record.id(), Some("1i1"));
        assert_eq!(
            record.labels().map(RawValue::get),
            Some(r#"{"tier": "web","app": "api"}"#)
        );
        assert_eq!(record.execute_url(), Some("http://rancher/x"));
    }

    #[test]
    fn null_or_missing_labels_are_absent() {
        let collection: ContainerCollection =
            serde_json::from_str(r#"{"data":[{"labels":null},{}]}"#).expect("parse");
        assert!(collection.data.iter().all(|r| r.labels().is_none()));
        assert!(collection.data.iter().all(|r| r.execute_url().is_none()));
    }

    #[test]
    fn containers_url_escapes_query_value() {
        let c = client("http://rancher:8080/v1");
        assert_eq!(
            c.containers_url(&ContainerSelector::ByName("a&b".into())),
            "http://rancher:8080/v1/containers?name=a%26b"
        );
    }
}
