//! CLI error types.

use flexinc_config::ConfigError;
use flexinc_core::IncludeError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Include(#[from] IncludeError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Access to {0} is denied")]
    AccessDenied(String),
}
