//! CLI error types.

use mdnb_config::ConfigError;
use mdnb_paths::ResolveError;
use mdnb_site::{CompileError, DocumentError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Document(#[from] DocumentError),

    #[error("{0}")]
    Pattern(#[from] glob::PatternError),
}
