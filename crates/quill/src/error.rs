//! CLI error types.

use quill_config::ConfigError;
use quill_pipeline::{BuildError, ProcessError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse definitions: {0}")]
    Definitions(#[from] serde_yaml::Error),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Process(#[from] ProcessError),
}
