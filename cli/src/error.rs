use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop the command line tool.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("cannot read template '{path}': {source}")]
    Template {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot encode variables as JSON: {0}")]
    Json(#[from] serde_json::Error),
}
