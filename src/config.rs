//! Configuration loading.
//!
//! [`ClientConfig`] is everything [`crate::Client::connect`] needs.
//! [`Config`] is the command-line application's configuration: a JSON file in
//! the platform config directory, overridden by `ALMOND_*` environment
//! variables.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fmt, fs};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_REFRESH_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
};
use crate::error::ClientError;

/// Connection settings for one hub session.
#[derive(Clone, Default)]
pub struct ClientConfig {
    /// `host:port` of the hub. Either part may be empty to use the default
    /// (`localhost`, `7681`).
    pub host: String,
    /// Hub account name.
    pub user: String,
    /// Hub account password.
    pub password: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Create a config for `host` with the given credentials.
    #[must_use]
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    /// Resolved `host:port`, with defaults filled in.
    pub fn authority(&self) -> Result<String, ClientError> {
        let (host, port) = split_host_port(&self.host)?;
        let host = if host.is_empty() { DEFAULT_HOST } else { host };
        let port = if port.is_empty() { DEFAULT_PORT } else { port };
        if host.contains(':') {
            Ok(format!("[{host}]:{port}"))
        } else {
            Ok(format!("{host}:{port}"))
        }
    }

    /// WebSocket URL of the hub. Credentials travel as the URL path, one
    /// percent-encoded segment each.
    pub fn url(&self) -> Result<String, ClientError> {
        let authority = self.authority()?;
        let mut url = Url::parse(&format!("ws://{authority}/")).map_err(|e| {
            ClientError::InvalidHost {
                host: self.host.clone(),
                reason: e.to_string(),
            }
        })?;

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.clear().extend(
                [self.user.as_str(), self.password.as_str()]
                    .into_iter()
                    .filter(|segment| !segment.is_empty()),
            );
        }
        Ok(url.into())
    }
}

/// Split `host:port`, accepting a bare host and bracketed IPv6 literals.
fn split_host_port(addr: &str) -> Result<(&str, &str), ClientError> {
    let invalid = |reason: &str| ClientError::InvalidHost {
        host: addr.to_string(),
        reason: reason.to_string(),
    };

    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(|| invalid("missing ']'"))?;
        return match tail {
            "" => Ok((host, "")),
            _ => tail
                .strip_prefix(':')
                .map(|port| (host, port))
                .ok_or_else(|| invalid("unexpected text after ']'")),
        };
    }

    match addr.matches(':').count() {
        0 => Ok((addr, "")),
        1 => Ok(addr.split_once(':').unwrap_or((addr, ""))),
        _ => Err(invalid("too many colons; bracket IPv6 addresses")),
    }
}

/// Command-line application configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Config {
    /// `host:port` of the hub.
    pub hub_addr: String,
    /// Hub account name.
    pub user: String,
    /// Hub account password. Read from the file or environment, never written
    /// back out.
    #[serde(skip_serializing)]
    pub password: String,
    /// Seconds between full device-list refreshes while watching.
    pub refresh_interval: u64,
    /// Seconds to wait for the reply to a single request.
    pub request_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub_addr: format!("{DEFAULT_HOST}:{DEFAULT_PORT}"),
            user: String::new(),
            password: String::new(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL.as_secs(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Returns the configuration directory path.
    ///
    /// `ALMOND_CONFIG_DIR` overrides the platform config directory.
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("ALMOND_CONFIG_DIR") {
            return Ok(PathBuf::from(dir));
        }
        Ok(dirs::config_dir()
            .context("Could not determine config directory")?
            .join("almond-hub"))
    }

    /// Loads `config.json` from the config directory (defaults if absent),
    /// then applies environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_dir()?.join("config.json");
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist. No environment overrides are applied.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("ALMOND_ADDR") {
            self.hub_addr = addr;
        }

        if let Ok(user) = std::env::var("ALMOND_USER") {
            self.user = user;
        }

        if let Ok(password) = std::env::var("ALMOND_PASSWORD") {
            self.password = password;
        }

        if let Ok(interval) = std::env::var("ALMOND_REFRESH_INTERVAL") {
            if let Ok(secs) = interval.parse::<u64>() {
                self.refresh_interval = secs;
            }
        }

        if let Ok(timeout) = std::env::var("ALMOND_REQUEST_TIMEOUT") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.request_timeout = secs;
            }
        }
    }

    /// Connection settings for [`crate::Client::connect`].
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.hub_addr, &self.user, &self.password)
    }

    /// Device-list refresh period. Zero disables refreshing.
    #[must_use]
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval > 0).then(|| Duration::from_secs(self.refresh_interval))
    }

    /// Per-request reply timeout. Zero waits indefinitely.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout > 0).then(|| Duration::from_secs(self.request_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_url_includes_credentials_as_path() {
        let config = ClientConfig::new("10.0.0.2:7681", "admin", "secret");
        assert_eq!(config.url().unwrap(), "ws://10.0.0.2:7681/admin/secret");
    }

    #[test]
    fn test_url_escapes_reserved_characters_in_credentials() {
        let config = ClientConfig::new("hub:7681", "ad min", "p#ss?w/rd%");
        let url = config.url().unwrap();
        assert_eq!(url, "ws://hub:7681/ad%20min/p%23ss%3Fw%2Frd%25");

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.path_segments().unwrap().count(), 2);
        assert_eq!(parsed.query(), None);
        assert_eq!(parsed.fragment(), None);
    }

    #[test]
    fn test_authority_defaults() {
        assert_eq!(ClientConfig::new("", "", "").authority().unwrap(), "localhost:7681");
        assert_eq!(ClientConfig::new(":9000", "", "").authority().unwrap(), "localhost:9000");
        assert_eq!(ClientConfig::new("hub.lan:", "", "").authority().unwrap(), "hub.lan:7681");
        assert_eq!(ClientConfig::new("hub.lan", "", "").authority().unwrap(), "hub.lan:7681");
    }

    #[test]
    fn test_authority_ipv6() {
        assert_eq!(ClientConfig::new("[::1]:7000", "", "").authority().unwrap(), "[::1]:7000");
        assert_eq!(ClientConfig::new("[::1]", "", "").authority().unwrap(), "[::1]:7681");
    }

    #[test]
    fn test_authority_rejects_ambiguous_addresses() {
        assert!(matches!(
            ClientConfig::new("::1", "", "").authority(),
            Err(ClientError::InvalidHost { .. })
        ));
        assert!(matches!(
            ClientConfig::new("[::1", "", "").authority(),
            Err(ClientError::InvalidHost { .. })
        ));
    }

    #[test]
    fn test_url_without_credentials() {
        assert_eq!(ClientConfig::default().url().unwrap(), "ws://localhost:7681/");
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", ClientConfig::new("hub:1", "admin", "hunter2"));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.hub_addr, "localhost:7681");
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(3600)));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_load_from_file_with_partial_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"hub_addr": "10.0.0.2:7681", "password": "pw", "refresh_interval": 0}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.hub_addr, "10.0.0.2:7681");
        assert_eq!(config.password, "pw");
        assert_eq!(config.refresh_interval(), None);
        assert_eq!(config.request_timeout, 10);
    }

    #[test]
    fn test_zero_request_timeout_disables_timeout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"request_timeout": 0}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_load_from_invalid_file_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_password_is_not_serialized() {
        let config = Config {
            password: "hunter2".to_string(),
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
