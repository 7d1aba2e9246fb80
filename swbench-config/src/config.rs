use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result, Scenario, Tideways};

/// A loaded run configuration. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Configuration {
    name: String,
    data_directory: PathBuf,
    scenario: Scenario,
    tideways: Tideways,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigurationFile {
    name: Option<String>,
    data_directory: Option<PathBuf>,
    scenario: Scenario,
    #[serde(default)]
    tideways: Tideways,
}

impl Configuration {
    pub fn new(
        name: impl Into<String>,
        data_directory: impl Into<PathBuf>,
        scenario: Scenario,
        tideways: Tideways,
    ) -> Result<Self> {
        let config = Self {
            name: name.into(),
            data_directory: data_directory.into(),
            scenario,
            tideways,
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads a `.json`, `.yaml` or `.yml` scenario file.
    ///
    /// `name` defaults to the file stem and `dataDirectory` to
    /// `results/<name>` next to the file. A relative `dataDirectory` is
    /// resolved against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file: ConfigurationFile = load_document(path)?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let name = match file.name {
            Some(name) => name,
            None => path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::Invalid(format!("cannot derive a name from {}", path.display()))
                })?,
        };

        let data_directory = match file.data_directory {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => base_dir.join(dir),
            None => base_dir.join("results").join(&name),
        };

        debug!(
            "Loaded configuration '{}' from {} (data directory {})",
            name,
            path.display(),
            data_directory.display()
        );
        Self::new(name, data_directory, file.scenario, file.tideways)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_directory(&self) -> &Path {
        &self.data_directory
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn tideways(&self) -> &Tideways {
        &self.tideways
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Invalid("name must not be empty".into()));
        }
        if self.name.contains(['/', '\\']) {
            return Err(Error::Invalid(format!(
                "name '{}' must not contain path separators",
                self.name
            )));
        }
        self.scenario.validate()?;
        self.tideways.validate()
    }
}

/// Reads a JSON or YAML document, picking the parser by file extension.
pub(crate) fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "json" => Ok(serde_json::from_str(&content)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
        _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
    }
}
