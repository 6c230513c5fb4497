//! Configuration file
//!
//! A JSON object; only `data_dir` is required.
//!
//! ```json
//! { "data_dir": "/var/lib/ration-ledger", "schema_dir": "./schemas" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::{CliError, CliResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the ledger and the event log
    pub data_dir: String,

    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,

    #[serde(default = "default_event_file")]
    pub event_file: String,

    /// Extra asset type definitions, one JSON file each
    #[serde(default)]
    pub schema_dir: Option<String>,

    /// Used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_ledger_file() -> String {
    "ledger.log".to_string()
}
fn default_event_file() -> String {
    "events.log".to_string()
}
fn default_log_filter() -> String {
    "ration_ledger=info".to_string()
}

impl Config {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }
        check_file_name("ledger_file", &self.ledger_file)?;
        check_file_name("event_file", &self.event_file)?;
        if self.ledger_file == self.event_file {
            return Err(CliError::config_error(
                "ledger_file and event_file must be different files",
            ));
        }
        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_path().join(&self.ledger_file)
    }

    pub fn event_path(&self) -> PathBuf {
        self.data_path().join(&self.event_file)
    }

    pub fn schema_path(&self) -> Option<&Path> {
        self.schema_dir.as_deref().map(Path::new)
    }
}

/// Plain file names only; both files live directly in `data_dir`
fn check_file_name(field: &str, name: &str) -> CliResult<()> {
    if name.trim().is_empty() {
        return Err(CliError::config_error(format!("{} must not be empty", field)));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(CliError::config_error(format!(
            "{} must be a file name, got '{}'",
            field, name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("ration-ledger.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_config_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"data_dir": "/tmp/ledger"}"#);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.ledger_file, "ledger.log");
        assert_eq!(config.event_file, "events.log");
        assert_eq!(config.log_filter, "ration_ledger=info");
        assert!(config.schema_path().is_none());
        assert_eq!(config.ledger_path(), Path::new("/tmp/ledger/ledger.log"));
    }

    #[test]
    fn test_config_requires_data_dir() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"ledger_file": "x.log"}"#);
        let err = Config::load(&path).unwrap_err();
        assert!(err.message().contains("Invalid config JSON"));

        let path = write_config(&dir, r#"{"data_dir": "  "}"#);
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_config_rejects_paths_as_file_names() {
        let dir = TempDir::new().unwrap();
        for body in [
            r#"{"data_dir": "d", "ledger_file": "../ledger.log"}"#,
            r#"{"data_dir": "d", "event_file": ""}"#,
            r#"{"data_dir": "d", "event_file": "ledger.log"}"#,
        ] {
            let path = write_config(&dir, body);
            assert!(Config::load(&path).is_err(), "accepted {}", body);
        }
    }
}
