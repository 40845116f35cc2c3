use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::Error;
use crate::http::{self, RequestHeaders};

/// Name of the optional configuration file.
pub const CONFIG_FILE: &str = ".stepref.toml";

/// Runtime configuration loaded from `.stepref.toml`.
/// Every field has a default, so an absent file means stock behavior.
#[derive(Debug, Clone)]
pub struct Config {
    /// Per-schema index page overrides, keyed by schema identifier.
    pub catalog: HashMap<String, Vec<String>>,
    /// Bound on each page fetch, in seconds.
    pub timeout_secs: u64,
    /// User agent sent to the documentation host.
    pub user_agent: String,
}

/// Raw TOML structure for `.stepref.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct StepRefTomlConfig {
    #[serde(default)]
    catalog: HashMap<String, Vec<String>>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

impl Config {
    /// Load config from `.stepref.toml` in the given root directory.
    ///
    /// # Errors
    ///
    /// Same as `load_file`.
    pub fn load(root: &Path) -> Result<Self, Error> {
        return Self::load_file(&root.join(CONFIG_FILE));
    }

    /// Load config from an explicit path.
    /// Returns defaults if the file doesn't exist. Returns an error if the file
    /// exists but is malformed; a config the user wrote is never silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed,
    /// or `Error::ConfigInvalid` if `timeout_secs` is zero.
    pub fn load_file(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(&content);
    }

    /// Parse config from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed,
    /// or `Error::ConfigInvalid` if `timeout_secs` is zero.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: StepRefTomlConfig = toml::from_str(content)?;
        let defaults = Self::default();

        let timeout_secs = raw.timeout_secs.unwrap_or(defaults.timeout_secs);
        if timeout_secs == 0 {
            return Err(Error::ConfigInvalid { reason: "timeout_secs must be at least 1".to_string() });
        }

        return Ok(Self {
            catalog: raw.catalog,
            timeout_secs,
            user_agent: raw.user_agent.unwrap_or(defaults.user_agent),
        });
    }

    /// The fetch bound as a duration.
    pub const fn timeout(&self) -> Duration {
        return Duration::from_secs(self.timeout_secs);
    }

    /// Browser-like request headers carrying the configured user agent.
    pub fn request_headers(&self) -> RequestHeaders {
        return RequestHeaders::browser(&self.user_agent);
    }
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            catalog: HashMap::new(),
            timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            user_agent: http::BROWSER_USER_AGENT.to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.timeout_secs, 8);
        assert!(config.catalog.is_empty());
    }

    #[test]
    fn reads_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "timeout_secs = 5\nuser_agent = \"test-agent\"\n\n[catalog]\nIFC4 = [\"https://docs.example/toc.htm\"]\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.request_headers().get("User-Agent"), Some("test-agent"));
        assert_eq!(config.catalog["IFC4"].len(), 1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(matches!(Config::parse("timeout_secs = \"soon\""), Err(Error::TomlDe(_))));
        assert!(matches!(Config::parse("colour = 1"), Err(Error::TomlDe(_))));
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(matches!(Config::parse("timeout_secs = 0"), Err(Error::ConfigInvalid { .. })));
    }
}
