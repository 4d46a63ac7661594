//! Agent configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via SIDEKICK_CONFIG or --config)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use sidekick_protocol::DEFAULT_AGENT_PORT;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "SIDEKICK_CONFIG";

/// Default per-operation I/O timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1000;

/// Where the agent listens.
///
/// Written as `unix:/path/to/socket`, `tcp:host:port`, or bare `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Endpoint {
    Tcp(String),
    Unix(PathBuf),
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::Tcp(format!("127.0.0.1:{}", DEFAULT_AGENT_PORT))
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidEndpoint(s.to_string());

        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(invalid());
            }
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }

        let addr = s.strip_prefix("tcp:").unwrap_or(s);
        match addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(Endpoint::Tcp(addr.to_string()))
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Endpoint {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "tcp:{}", addr),
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// Client-side configuration for talking to an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Agent endpoint.
    pub endpoint: Endpoint,
    /// Timeout applied to each write and each read, in milliseconds.
    pub timeout_ms: u64,
    /// Timeout for establishing the connection, in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl AgentConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                let mut config = Self::from_file(path)?;
                config.apply_env_overrides();
                Ok(config)
            }
            Err(_) => Ok(Self::from_env()),
        }
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Applies `SIDEKICK_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from an arbitrary variable lookup. Unparseable
    /// values are skipped with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("SIDEKICK_AGENT") {
            match value.parse() {
                Ok(endpoint) => self.endpoint = endpoint,
                Err(e) => tracing::warn!("ignoring SIDEKICK_AGENT: {}", e),
            }
        }

        if let Some(value) = lookup("SIDEKICK_TIMEOUT_MS") {
            match value.parse() {
                Ok(ms) => self.timeout_ms = ms,
                Err(_) => tracing::warn!("ignoring SIDEKICK_TIMEOUT_MS: not a number: {}", value),
            }
        }

        if let Some(value) = lookup("SIDEKICK_CONNECT_TIMEOUT_MS") {
            match value.parse() {
                Ok(ms) => self.connect_timeout_ms = ms,
                Err(_) => tracing::warn!(
                    "ignoring SIDEKICK_CONNECT_TIMEOUT_MS: not a number: {}",
                    value
                ),
            }
        }
    }

    /// Per-operation I/O timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Renders the configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    InvalidEndpoint(String),
    Serialize(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidEndpoint(s) => write!(
                f,
                "invalid agent endpoint '{}': expected unix:PATH, tcp:HOST:PORT or HOST:PORT",
                s
            ),
            ConfigError::Serialize(e) => write!(f, "failed to serialize config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(_, e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.endpoint, Endpoint::Tcp("127.0.0.1:3005".to_string()));
        assert_eq!(config.timeout(), Duration::from_millis(1000));
        assert_eq!(config.connect_timeout(), Duration::from_millis(1000));
    }

    #[test]
    fn test_parse_endpoints() {
        assert_eq!(
            "unix:/run/agent.sock".parse::<Endpoint>().unwrap(),
            Endpoint::Unix(PathBuf::from("/run/agent.sock"))
        );
        assert_eq!(
            "tcp:agent.local:3005".parse::<Endpoint>().unwrap(),
            Endpoint::Tcp("agent.local:3005".to_string())
        );
        assert_eq!(
            "10.0.0.5:4000".parse::<Endpoint>().unwrap(),
            Endpoint::Tcp("10.0.0.5:4000".to_string())
        );
        assert_eq!(
            "[::1]:3005".parse::<Endpoint>().unwrap(),
            Endpoint::Tcp("[::1]:3005".to_string())
        );
    }

    #[test]
    fn test_parse_invalid_endpoints() {
        for bad in ["", "unix:", "localhost", "tcp:host:", ":3005", "host:99999"] {
            assert!(
                matches!(bad.parse::<Endpoint>(), Err(ConfigError::InvalidEndpoint(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_endpoint_display_roundtrip() {
        for s in ["unix:/tmp/a.sock", "tcp:127.0.0.1:3005"] {
            let endpoint: Endpoint = s.parse().unwrap();
            assert_eq!(endpoint.to_string(), s);
        }
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = AgentConfig::new(Endpoint::Unix(PathBuf::from("/run/agent.sock")))
            .with_timeout(Duration::from_millis(250));
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("unix:/run/agent.sock"));

        let parsed: AgentConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint: tcp:agent.internal:3005").unwrap();
        writeln!(file, "timeout_ms: 5000").unwrap();

        let config = AgentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.endpoint, Endpoint::Tcp("agent.internal:3005".to_string()));
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS);
    }

    #[test]
    fn test_from_file_bad_endpoint() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint: nowhere").unwrap();

        let result = AgentConfig::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_, _))));
    }

    #[test]
    fn test_from_file_missing() {
        let result = AgentConfig::from_file("/nonexistent/sidekick.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_, _))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SIDEKICK_AGENT", "unix:/tmp/agent.sock"),
            ("SIDEKICK_TIMEOUT_MS", "250"),
            ("SIDEKICK_CONNECT_TIMEOUT_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = AgentConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.endpoint, Endpoint::Unix(PathBuf::from("/tmp/agent.sock")));
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS);
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let config = AgentConfig::default()
            .with_timeout(Duration::MAX)
            .with_connect_timeout(Duration::from_millis(u64::MAX));
        assert_eq!(config.timeout_ms, u64::MAX);
        assert_eq!(config.connect_timeout_ms, u64::MAX);
    }

    #[test]
    fn test_invalid_endpoint_override_ignored() {
        let mut config = AgentConfig::default();
        config.apply_overrides(|name| (name == "SIDEKICK_AGENT").then(|| "garbage".to_string()));
        assert_eq!(config.endpoint, Endpoint::default());
    }
}
