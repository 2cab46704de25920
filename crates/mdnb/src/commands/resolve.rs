//! `mdnb resolve` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdnb_config::{CliSettings, Config};
use mdnb_paths::PathResolver;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the resolve command.
#[derive(Args)]
pub(crate) struct ResolveArgs {
    /// Abbreviated document path (e.g. "2018/RS532").
    path: String,

    /// Notebook source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Print the absolute filesystem path instead of the notebook-relative
    /// form.
    #[arg(long)]
    absolute: bool,

    /// Keep the document extension in the result.
    #[arg(long)]
    keep_extension: bool,

    /// Path to configuration file (default: auto-discover mdnb.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ResolveArgs {
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source_dir.clone(),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let notebook = &config.notebook_resolved;

        let resolver = PathResolver::new(&notebook.source_dir)
            .extension(&notebook.doc_extension)
            .strip_extension(!self.keep_extension)
            .relative_to_root(!self.absolute)
            .forward_slashes(!self.absolute);

        let resolved = resolver.resolve(&self.path)?;
        output.info(&resolved);
        Ok(())
    }
}
