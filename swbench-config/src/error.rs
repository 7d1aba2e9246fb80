use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Unknown execution mode '{0}', expected 'docker' or 'local'")]
    UnknownExecutionMode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
