//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Container runtime to drive ("docker" or "podman")
    pub runtime: String,
    /// Root directory artifacts are written under
    pub dest_root: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: "docker".to_string(),
            dest_root: "build".to_string(),
        }
    }
}

/// Errors raised while loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file '{path}'")]
    Read {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file contents could not be parsed
    #[error("failed to parse config file '{path}': {reason}")]
    Parse {
        /// Path of the unparseable file.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },
}

impl Config {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the file cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.runtime, "docker");
        assert_eq!(config.dest_root, "build");
    }

    #[test]
    fn test_config_load_merges_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "runtime: podman").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.runtime, "podman");
        assert_eq!(config.dest_root, "build");
    }

    #[test]
    fn test_config_load_reports_missing_file() {
        let result = Config::load(Path::new("/nonexistent/forgebox.yaml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
