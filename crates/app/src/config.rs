//! Application configuration
//!
//! Settings are layered: built-in defaults, then an optional
//! `varscope.yaml` (or any format the `config` crate recognises), then
//! `VARSCOPE_*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use varscope_domain::{DEFAULT_TIME_RANGE, DomainResult, TimeRange};

/// Base name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "varscope";

/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "VARSCOPE";

/// Runtime settings of the `varscope` binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Root of the file-backed resource store.
    pub data_dir: PathBuf,
    /// Resource API base URL. When set, the HTTP store replaces the file
    /// store.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Project used when a command names none.
    #[serde(default)]
    pub project: Option<String>,
    /// Relative time range applied when the link carries none.
    pub default_time_range: String,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl AppConfig {
    /// Loads the configuration from `file` (or `varscope.*` in the working
    /// directory) and the process environment.
    ///
    /// # Errors
    /// Returns an error if a source cannot be read or a value has the wrong
    /// type.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(file, Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads the configuration from an explicit environment source.
    ///
    /// # Errors
    /// Returns an error if a source cannot be read or a value has the wrong
    /// type.
    pub fn from_sources(file: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(CONFIG_FILE).required(false),
        };

        Config::builder()
            .set_default("data_dir", "data")?
            .set_default("default_time_range", DEFAULT_TIME_RANGE)?
            .set_default("log_filter", "info")?
            .add_source(file_source)
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    /// Returns the configured default time range.
    ///
    /// # Errors
    /// Returns an error if the duration is malformed.
    pub fn time_range(&self) -> DomainResult<TimeRange> {
        TimeRange::relative(&self.default_time_range)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use config::Map;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let vars: Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(vars))
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().expect("Should create temp dir");
        let path = dir.path().join("varscope.yaml");
        std::fs::write(&path, "{}\n").expect("Should write");

        let config = AppConfig::from_sources(Some(&path), environment(&[])).expect("Should load");

        assert_eq!(
            config,
            AppConfig {
                data_dir: PathBuf::from("data"),
                api_url: None,
                project: None,
                default_time_range: "1h".to_string(),
                log_filter: "info".to_string(),
            }
        );
        assert_eq!(config.time_range().expect("Should parse"), TimeRange::default());
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().expect("Should create temp dir");
        let path = dir.path().join("varscope.yaml");
        std::fs::write(
            &path,
            "data_dir: /srv/varscope\nproject: infra\ndefault_time_range: 6h\n",
        )
        .expect("Should write");

        let config = AppConfig::from_sources(
            Some(&path),
            environment(&[("VARSCOPE_PROJECT", "web"), ("VARSCOPE_LOG_FILTER", "debug")]),
        )
        .expect("Should load");

        assert_eq!(config.data_dir, PathBuf::from("/srv/varscope"));
        assert_eq!(config.project.as_deref(), Some("web"));
        assert_eq!(config.default_time_range, "6h");
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().expect("Should create temp dir");

        let result = AppConfig::from_sources(Some(&dir.path().join("absent.yaml")), environment(&[]));

        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_time_range() {
        let dir = TempDir::new().expect("Should create temp dir");
        let path = dir.path().join("varscope.yaml");
        std::fs::write(&path, "default_time_range: soon\n").expect("Should write");

        let config = AppConfig::from_sources(Some(&path), environment(&[])).expect("Should load");

        assert!(config.time_range().is_err());
    }
}
