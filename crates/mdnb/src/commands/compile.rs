//! `mdnb compile` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use mdnb_config::{CliSettings, Config};
use mdnb_paths::PathResolver;
use mdnb_renderer::CmarkBackend;
use mdnb_site::Compiler;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the compile command.
#[derive(Args)]
pub(crate) struct CompileArgs {
    /// Document path, absolute or abbreviated (e.g. "2018/RS532").
    path: String,

    /// Template name (overrides the document's `template` key).
    #[arg(short, long)]
    template: Option<String>,

    /// Notebook source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Template directory (overrides config).
    #[arg(long)]
    template_dir: Option<PathBuf>,

    /// Disable the compiled-output cache.
    #[arg(long)]
    no_cache: bool,

    /// Print the compiled HTML to stdout.
    #[arg(long)]
    stdout: bool,

    /// Path to configuration file (default: auto-discover mdnb.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl CompileArgs {
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source_dir.clone(),
            template_dir: self.template_dir.clone(),
            cache_enabled: self.no_cache.then_some(false),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let notebook = &config.notebook_resolved;
        let templates = &config.templates_resolved;

        // Expand the possibly-abbreviated path to the actual source file.
        let resolver = PathResolver::new(&notebook.source_dir)
            .extension(&notebook.doc_extension)
            .strip_extension(false)
            .relative_to_root(false)
            .forward_slashes(false);
        let source = PathBuf::from(resolver.resolve(&self.path)?);
        tracing::info!(request = %self.path, source = %source.display(), "resolved document");

        output.info(&format!("Source: {}", source.display()));

        let compiler = Compiler::new(&templates.dir)
            .with_backend(Box::new(CmarkBackend::new().with_gfm(config.render.gfm)))
            .with_default_template(&templates.default)
            .with_template_patterns(templates.patterns.clone())
            .with_cache_enabled(notebook.cache_enabled);

        let result = compiler.compile(&source, self.template.as_deref())?;

        if let Some(diag) = &result.diagnostic {
            output.warning(&format!("Front matter issues: {}", diag.summary()));
            let detail = diag.detail();
            if !detail.is_empty() {
                output.warning(&detail);
            }
        }

        if self.stdout {
            write_stdout(&result.html)?;
        }

        if result.from_cache {
            output.success(&format!("Up to date: {}", result.output_path.display()));
        } else {
            output.success(&format!("Compiled to {}", result.output_path.display()));
        }
        Ok(())
    }
}

fn write_stdout(html: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(html.as_bytes())?;
    stdout.flush()
}
