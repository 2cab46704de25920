//! `mdnb tree` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdnb_config::{CliSettings, Config};
use mdnb_paths::{Matcher, NodeKind, PageTreeBuilder, PathNode};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the tree command.
#[derive(Args)]
pub(crate) struct TreeArgs {
    /// Maximum tree depth.
    #[arg(short, long, default_value_t = 3)]
    depth: usize,

    /// Only include files matching this glob (matched against names).
    #[arg(long)]
    include: Option<String>,

    /// Exclude files matching this glob (matched against names).
    #[arg(long)]
    exclude: Option<String>,

    /// Skip symlinked entries.
    #[arg(long)]
    no_symlinks: bool,

    /// Notebook source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdnb.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl TreeArgs {
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source_dir.clone(),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let notebook = &config.notebook_resolved;

        let mut builder = PageTreeBuilder::new(&notebook.source_dir)
            .extension(&notebook.doc_extension)
            .exclude_symlinks(self.no_symlinks);
        if let Some(pattern) = &self.include {
            builder = builder.file_include(Matcher::glob(pattern)?);
        }
        if let Some(pattern) = &self.exclude {
            builder = builder.file_exclude(Matcher::glob(pattern)?);
        }

        let root = builder.build(self.depth)?;
        print_node(output, &root, 0);
        Ok(())
    }
}

fn print_node(output: &Output, node: &PathNode, indent: usize) {
    let marker = match node.kind {
        NodeKind::Folder => "/",
        NodeKind::File => "",
    };
    output.info(&format!("{}{}{}", "  ".repeat(indent), node.name, marker));
    for child in &node.children {
        print_node(output, child, indent + 1);
    }
}
