// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interfaces for parsing configuration files for the lifecycle orchestrator

use camino::Utf8Path;
use camino::Utf8PathBuf;
use dropshot::ConfigLogging;
use provision_lock::SERIALIZED_ACTION_LOCK;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration for the lifecycle orchestrator
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Config {
    /// Logging configuration.
    pub log: ConfigLogging,
    /// The lock that serializes lifecycle actions.
    #[serde(default)]
    pub lock: LockConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LockConfig {
    /// Name of the lock taken by every destructive action.
    #[serde(default = "default_lock_name")]
    pub name: String,
    /// How long an action waits for the lock before failing.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_lock_name() -> String {
    SERIALIZED_ACTION_LOCK.to_owned()
}

fn default_acquire_timeout_secs() -> u64 {
    100
}

impl Default for LockConfig {
    fn default() -> Self {
        LockConfig {
            name: default_lock_name(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl LockConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl Config {
    /// Load a `Config` from the given TOML file
    pub fn from_file(path: &Utf8Path) -> Result<Config, LoadError> {
        let file_contents = std::fs::read_to_string(path)
            .map_err(|err| LoadError::Io { path: path.into(), err })?;
        let config_parsed: Config = toml::from_str(&file_contents)
            .map_err(|err| LoadError::Parse { path: path.into(), err })?;
        Ok(config_parsed)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("error reading \"{path}\": {err}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("error parsing \"{path}\": {err}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        err: toml::de::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;
    use camino_tempfile::Utf8TempDir;
    use dropshot::ConfigLoggingLevel;

    fn read_config(contents: &str) -> Result<Config, LoadError> {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        Config::from_file(&path)
    }

    #[test]
    fn test_example_config() {
        let path = Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("examples/config.toml");
        let config = Config::from_file(&path).unwrap();
        assert_eq!(
            config.log,
            ConfigLogging::StderrTerminal { level: ConfigLoggingLevel::Info }
        );
        assert_eq!(config.lock, LockConfig::default());
        assert_eq!(config.lock.acquire_timeout(), Duration::from_secs(100));
    }

    #[test]
    fn test_lock_section_defaults() {
        let config = read_config(
            r#"
            [log]
            level = "debug"
            mode = "stderr-terminal"
            "#,
        )
        .unwrap();
        assert_eq!(config.lock.name, "serialized_action");
        assert_eq!(config.lock.acquire_timeout_secs, 100);

        let config = read_config(
            r#"
            [log]
            level = "debug"
            mode = "stderr-terminal"

            [lock]
            acquire_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.lock.name, "serialized_action");
        assert_eq!(config.lock.acquire_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_errors() {
        let error =
            Config::from_file(Utf8Path::new("/nonexistent")).unwrap_err();
        assert_matches!(error, LoadError::Io { .. });
        assert!(error
            .to_string()
            .starts_with("error reading \"/nonexistent\""));

        let error = read_config("").unwrap_err();
        assert_matches!(error, LoadError::Parse { .. });
        assert!(error.to_string().contains("missing field"));

        let error = read_config(
            r#"
            [log]
            level = "debug"
            mode = "stderr-terminal"

            [lock]
            acquire_timeout_secs = "forever"
            "#,
        )
        .unwrap_err();
        assert_matches!(error, LoadError::Parse { .. });
    }
}
