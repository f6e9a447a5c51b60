//! Connection configuration.
//!
//! Credentials for the Cattle API come from the process environment:
//! - `CATTLE_URL` - base URL of the API (e.g. `https://rancher.example.com/v1`)
//! - `CATTLE_ACCESS_KEY` - API access key
//! - `CATTLE_SECRET_KEY` - API secret key
//!
//! All three are required. Values are trimmed and a trailing `/` on the base
//! URL is dropped so query URLs can be built by simple concatenation.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::error::ExecError;

/// Environment variable holding the API base URL.
pub const ENV_URL: &str = "CATTLE_URL";
/// Environment variable holding the API access key.
pub const ENV_ACCESS_KEY: &str = "CATTLE_ACCESS_KEY";
/// Environment variable holding the API secret key.
pub const ENV_SECRET_KEY: &str = "CATTLE_SECRET_KEY";

/// Default TCP/TLS connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a whole HTTP request/response exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default longest silence tolerated on an exec WebSocket.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Resolved API endpoint and credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    base_url: String,
    access_key: String,
    secret_key: String,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("base_url", &self.base_url)
            .field("access_key", &self.access_key)
            .finish_non_exhaustive()
    }
}

impl ConnectionConfig {
    /// Build a config from explicit values.
    #[must_use]
    pub fn new(
        base_url: impl AsRef<str>,
        access_key: impl AsRef<str>,
        secret_key: impl AsRef<str>,
    ) -> Self {
        Self {
            base_url: base_url.as_ref().trim().trim_end_matches('/').to_string(),
            access_key: access_key.as_ref().trim().to_string(),
            secret_key: secret_key.as_ref().trim().to_string(),
        }
    }

    /// Resolve the config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::ConfigMissing`] naming the first variable that is
    /// absent or blank.
    pub fn from_env() -> Result<Self, ExecError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the config through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::ConfigMissing`] naming the first variable that is
    /// absent or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ExecError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ExecError> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ExecError::ConfigMissing(name))
        };

        let base_url = required(ENV_URL)?;
        let access_key = required(ENV_ACCESS_KEY)?;
        let secret_key = required(ENV_SECRET_KEY)?;
        debug!(base_url = %base_url, "resolved cattle connection");

        Ok(Self::new(base_url, access_key, secret_key))
    }

    /// API base URL, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// API access key (Basic auth user).
    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// API secret key (Basic auth password).
    #[must_use]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

/// Deadlines applied to every network operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Connect timeout for HTTP and WebSocket connections.
    pub connect: Duration,
    /// Whole-exchange timeout for HTTP requests.
    pub request: Duration,
    /// Longest gap between WebSocket frames (None = wait forever).
    pub idle_read: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            request: DEFAULT_REQUEST_TIMEOUT,
            idle_read: Some(DEFAULT_IDLE_TIMEOUT),
        }
    }
}

impl Timeouts {
    /// Build timeouts from whole seconds; an idle timeout of 0 disables it.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Config`] if the connect or request timeout is 0.
    pub fn from_secs(connect: u64, request: u64, idle_read: u64) -> Result<Self, ExecError> {
        if connect == 0 {
            return Err(ExecError::Config(
                "connect timeout must be greater than 0".to_string(),
            ));
        }
        if request == 0 {
            return Err(ExecError::Config(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            connect: Duration::from_secs(connect),
            request: Duration::from_secs(request),
            idle_read: (idle_read > 0).then(|| Duration::from_secs(idle_read)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_resolves_all_three_values() {
        let config = ConnectionConfig::from_lookup(lookup_from(&[
            (ENV_URL, "http://rancher:8080/v1"),
            (ENV_ACCESS_KEY, "access"),
            (ENV_SECRET_KEY, "secret"),
        ]))
        .expect("should resolve");

        assert_eq!(config.base_url(), "http://rancher:8080/v1");
        assert_eq!(config.access_key(), "access");
        assert_eq!(config.secret_key(), "secret");
    }

    #[test]
    fn test_values_are_trimmed() {
        let config = ConnectionConfig::from_lookup(lookup_from(&[
            (ENV_URL, "  http://rancher:8080/v1/ \n"),
            (ENV_ACCESS_KEY, "\taccess "),
            (ENV_SECRET_KEY, " secret\n"),
        ]))
        .expect("should resolve");

        assert_eq!(config.base_url(), "http://rancher:8080/v1");
        assert_eq!(config.access_key(), "access");
        assert_eq!(config.secret_key(), "secret");
    }

    #[test]
    fn test_missing_secret_key_is_named() {
        let err = ConnectionConfig::from_lookup(lookup_from(&[
            (ENV_URL, "http://rancher:8080/v1"),
            (ENV_ACCESS_KEY, "access"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ExecError::ConfigMissing(ENV_SECRET_KEY)));
        assert!(err.to_string().contains("CATTLE_SECRET_KEY"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let err = ConnectionConfig::from_lookup(lookup_from(&[
            (ENV_URL, "   "),
            (ENV_ACCESS_KEY, "access"),
            (ENV_SECRET_KEY, "secret"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ExecError::ConfigMissing(ENV_URL)));
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = ConnectionConfig::new("http://rancher", "access", "hunter2");
        let debug = format!("{config:?}");
        assert!(debug.contains("access"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_timeouts_from_secs() {
        let t = Timeouts::from_secs(5, 20, 0).expect("valid");
        assert_eq!(t.connect, Duration::from_secs(5));
        assert_eq!(t.request, Duration::from_secs(20));
        assert_eq!(t.idle_read, None);

        assert!(Timeouts::from_secs(0, 20, 10).is_err());
        assert!(Timeouts::from_secs(5, 0, 10).is_err());
    }

    #[test]
    fn test_default_timeouts() {
        let t = Timeouts::default();
        assert_eq!(t.connect, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(t.idle_read, Some(DEFAULT_IDLE_TIMEOUT));
    }
}
