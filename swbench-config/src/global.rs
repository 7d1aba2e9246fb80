use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::load_document;
use crate::{Error, Result};

pub const GLOBAL_DIR_ENV: &str = "SWBENCH_GLOBAL_DIR";
pub const EXECUTION_MODE_ENV: &str = "SWBENCH_EXECUTION_MODE";
const GLOBAL_DIR_NAME: &str = ".swbench";
const GLOBAL_FILE_STEM: &str = "global";

/// How the Locust process is started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Through `docker-compose run master`.
    Docker,
    #[default]
    Local,
}

impl FromStr for ExecutionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker" => Ok(ExecutionMode::Docker),
            "local" => Ok(ExecutionMode::Local),
            other => Err(Error::UnknownExecutionMode(other.to_string())),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Docker => write!(f, "docker"),
            ExecutionMode::Local => write!(f, "local"),
        }
    }
}

/// Machine-wide settings shared by all scenarios.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalConfiguration {
    pub execution_mode: ExecutionMode,
}

impl GlobalConfiguration {
    /// Loads the global configuration from `$SWBENCH_GLOBAL_DIR` (or
    /// `~/.swbench`), then applies `$SWBENCH_EXECUTION_MODE` on top.
    pub fn from_global_directory() -> Result<Self> {
        let config = match global_directory() {
            Some(dir) => Self::from_directory(&dir)?,
            None => Self::default(),
        };
        config.with_execution_mode_override(std::env::var(EXECUTION_MODE_ENV).ok().as_deref())
    }

    /// Reads `global.json`, `global.yaml` or `global.yml` from `dir`. A
    /// directory without any of them yields the defaults.
    pub fn from_directory(dir: &Path) -> Result<Self> {
        for ext in ["json", "yaml", "yml"] {
            let path = dir.join(format!("{GLOBAL_FILE_STEM}.{ext}"));
            if path.is_file() {
                debug!("Loading global configuration from {}", path.display());
                return load_document(&path);
            }
        }
        debug!(
            "No global configuration in {}, using defaults",
            dir.display()
        );
        Ok(Self::default())
    }

    pub fn with_execution_mode_override(mut self, mode: Option<&str>) -> Result<Self> {
        if let Some(mode) = mode.filter(|m| !m.trim().is_empty()) {
            self.execution_mode = mode.parse()?;
        }
        Ok(self)
    }
}

fn global_directory() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(GLOBAL_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(GLOBAL_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_execution_modes() {
        assert_eq!("docker".parse::<ExecutionMode>().unwrap(), ExecutionMode::Docker);
        assert_eq!(" Local ".parse::<ExecutionMode>().unwrap(), ExecutionMode::Local);
        assert!(matches!(
            "kubernetes".parse::<ExecutionMode>(),
            Err(Error::UnknownExecutionMode(_))
        ));
    }

    #[test]
    fn missing_file_means_local() {
        let dir = TempDir::new().unwrap();
        let config = GlobalConfiguration::from_directory(dir.path()).unwrap();
        assert_eq!(config.execution_mode, ExecutionMode::Local);
    }

    #[test]
    fn reads_json_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("global.json"),
            r#"{ "executionMode": "docker" }"#,
        )
        .unwrap();
        let config = GlobalConfiguration::from_directory(dir.path()).unwrap();
        assert_eq!(config.execution_mode, ExecutionMode::Docker);
    }

    #[test]
    fn reads_yaml_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("global.yml"), "executionMode: docker\n").unwrap();
        let config = GlobalConfiguration::from_directory(dir.path()).unwrap();
        assert_eq!(config.execution_mode, ExecutionMode::Docker);
    }

    #[test]
    fn override_wins_and_blank_is_ignored() {
        let config = GlobalConfiguration {
            execution_mode: ExecutionMode::Docker,
        };
        let same = config.clone().with_execution_mode_override(Some("  ")).unwrap();
        assert_eq!(same.execution_mode, ExecutionMode::Docker);
        let local = config.with_execution_mode_override(Some("local")).unwrap();
        assert_eq!(local.execution_mode, ExecutionMode::Local);
    }
}
