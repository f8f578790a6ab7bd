//! Client and wait configuration.
//!
//! [`ClientConfig`] describes how to reach the server and which spaces are
//! selected by default. It is usually loaded from an `octopus.toml` file or
//! from the environment.
//!
//! # Example Configuration File
//!
//! ```toml
//! server_url = "https://octopus.example.com"
//! timeout_ms = 30000
//! space_ids = ["Spaces-1"]
//! poll_interval_secs = 4
//! wait_timeout_minutes = 30
//!
//! [headers]
//! "X-Octopus-ApiKey" = "API-XXXXXXXX"
//! ```
//!
//! [`WaitOptions`] controls a single completion wait: poll interval,
//! overall timeout and an optional cancellation token.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::space::SpaceContext;

/// Default interval between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Configuration for connecting to a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL that relative resource links resolve against.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Extra headers sent with every request.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Spaces selected by default. `None` selects all spaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_ids: Option<Vec<String>>,

    /// Default poll interval for completion waits, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Default completion wait timeout in minutes. 0 waits forever.
    #[serde(default)]
    pub wait_timeout_minutes: u64,
}

fn default_server_url() -> String {
    "http://localhost".to_string()
}

fn default_timeout() -> u64 {
    30_000 // 30 seconds
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            timeout_ms: default_timeout(),
            headers: HashMap::new(),
            space_ids: None,
            poll_interval_secs: default_poll_interval_secs(),
            wait_timeout_minutes: 0,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration pointing at `server_url` with all other settings defaulted.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TransportError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TransportError::Configuration(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, TransportError> {
        toml::from_str(content)
            .map_err(|e| TransportError::Configuration(format!("TOML parse error: {}", e)))
    }

    /// Serializes the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, TransportError> {
        toml::to_string_pretty(self).map_err(|e| TransportError::Configuration(e.to_string()))
    }

    /// Loads configuration from environment variables.
    ///
    /// - `OCTOPUS_SERVER_URL` - Server URL
    /// - `OCTOPUS_TIMEOUT_MS` - Request timeout in milliseconds
    /// - `OCTOPUS_SPACE_IDS` - Comma separated default spaces
    /// - `OCTOPUS_POLL_INTERVAL_SECS` - Default poll interval
    /// - `OCTOPUS_WAIT_TIMEOUT_MINUTES` - Default wait timeout
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("OCTOPUS_SERVER_URL") {
            config.server_url = url;
        }
        if let Some(ms) = lookup("OCTOPUS_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            config.timeout_ms = ms;
        }
        if let Some(spaces) = lookup("OCTOPUS_SPACE_IDS") {
            let ids: Vec<String> = spaces
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            config.space_ids = Some(ids);
        }
        if let Some(secs) = lookup("OCTOPUS_POLL_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            config.poll_interval_secs = secs;
        }
        if let Some(mins) = lookup("OCTOPUS_WAIT_TIMEOUT_MINUTES").and_then(|v| v.parse().ok()) {
            config.wait_timeout_minutes = mins;
        }

        config
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Adds a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Selects the given spaces by default.
    pub fn with_spaces<I, S>(mut self, space_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.space_ids = Some(space_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The default space context described by this configuration.
    pub fn space_context(&self) -> SpaceContext {
        match &self.space_ids {
            Some(ids) => SpaceContext::specific(ids.iter().cloned()),
            None => SpaceContext::AllSpaces,
        }
    }

    /// Default wait options described by this configuration.
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::default()
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
            .with_timeout_minutes(self.wait_timeout_minutes)
    }
}

/// Options for one completion wait.
///
/// # Defaults
///
/// | Setting         | Default | Description                                    |
/// |-----------------|---------|------------------------------------------------|
/// | `poll_interval` | 4s      | Sleep between poll cycles                      |
/// | `timeout`       | `None`  | Give up after this long; `None` or zero = never |
/// | `cancellation`  | `None`  | Token that interrupts fetches and sleeps       |
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use octopus_client::WaitOptions;
///
/// let options = WaitOptions::default();
/// assert_eq!(options.poll_interval, Duration::from_secs(4));
/// assert_eq!(options.effective_timeout(), None);
///
/// let options = WaitOptions::default()
///     .with_poll_interval(Duration::from_secs(1))
///     .with_timeout_minutes(10);
/// assert_eq!(options.effective_timeout(), Some(Duration::from_secs(600)));
///
/// // A zero timeout waits forever.
/// let options = WaitOptions::default().with_timeout(Duration::ZERO);
/// assert_eq!(options.effective_timeout(), None);
/// ```
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Sleep between poll cycles.
    pub poll_interval: Duration,
    /// Overall timeout. `None` or zero waits forever.
    pub timeout: Option<Duration>,
    /// Cancels the wait when triggered.
    pub cancellation: Option<CancellationToken>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            cancellation: None,
        }
    }
}

impl WaitOptions {
    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the overall timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the overall timeout in minutes. 0 waits forever.
    pub fn with_timeout_minutes(self, minutes: u64) -> Self {
        self.with_timeout(Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// Attaches a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The timeout to enforce, if any. Zero counts as no timeout.
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.server_url, "http://localhost");
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.poll_interval_secs, 4);
        assert_eq!(config.wait_timeout_minutes, 0);
        assert_eq!(config.space_context(), SpaceContext::AllSpaces);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            server_url = "https://octopus.example.com"
            space_ids = ["Spaces-1", "Spaces-2"]
            wait_timeout_minutes = 15

            [headers]
            "X-Octopus-ApiKey" = "API-123"
        "#;

        let config = ClientConfig::from_toml(toml).unwrap();
        assert_eq!(config.server_url, "https://octopus.example.com");
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(
            config.headers.get("X-Octopus-ApiKey"),
            Some(&"API-123".to_string())
        );
        assert_eq!(
            config.space_context(),
            SpaceContext::specific(["Spaces-1", "Spaces-2"])
        );

        let wait = config.wait_options();
        assert_eq!(wait.poll_interval, Duration::from_secs(4));
        assert_eq!(wait.effective_timeout(), Some(Duration::from_secs(900)));
    }

    #[test]
    fn test_huge_wait_timeout_saturates() {
        let config = ClientConfig {
            wait_timeout_minutes: u64::MAX,
            ..ClientConfig::default()
        };
        assert_eq!(
            config.wait_options().effective_timeout(),
            Some(Duration::from_secs(u64::MAX))
        );

        let config = ClientConfig::from_toml("wait_timeout_minutes = 307445734561825861").unwrap();
        let timeout = config.wait_options().effective_timeout().unwrap();
        assert!(timeout > Duration::from_secs(60 * 60 * 24 * 365));
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let err = ClientConfig::from_toml("timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server_url = \"http://octo:8080\"").unwrap();
        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server_url, "http://octo:8080");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ClientConfig::new("http://octo")
            .with_timeout(5_000)
            .with_spaces(["Spaces-9"]);
        let parsed = ClientConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("OCTOPUS_SERVER_URL", "http://env-octo"),
            ("OCTOPUS_TIMEOUT_MS", "1000"),
            ("OCTOPUS_SPACE_IDS", "Spaces-1, Spaces-2,"),
            ("OCTOPUS_POLL_INTERVAL_SECS", "not-a-number"),
            ("OCTOPUS_WAIT_TIMEOUT_MINUTES", "3"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.server_url, "http://env-octo");
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert_eq!(
            config.space_ids,
            Some(vec!["Spaces-1".to_string(), "Spaces-2".to_string()])
        );
        assert_eq!(config.poll_interval_secs, 4);
        assert_eq!(config.wait_timeout_minutes, 3);
    }
}
