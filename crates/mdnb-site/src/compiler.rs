//! The compilation pipeline.
//!
//! [`Compiler`] turns a Markdown source file into a complete HTML page:
//! staleness check against the existing output, front-matter parse,
//! `%variable%` substitution over the body, Markdown rendering, and
//! template application. The output file is replaced atomically via a
//! temp file and rename, so readers never observe a partial write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use mdnb_meta::{
    FrontMatterParser, MissingVarPolicy, ParseDiagnostic, SubstituteError, VariableSubstitutor,
};
use mdnb_renderer::{CmarkBackend, MarkdownBackend};
use mdnb_templates::{TemplateError, TemplateRenderer, TemplateResolver, template_name};
use serde_yaml::Value;

use crate::document::{Document, DocumentError, load_document};

/// Extension given to compiled output files.
const OUTPUT_EXTENSION: &str = "html";

/// Error produced by the compilation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Loading the source document failed.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// Template resolution or rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// Body variable substitution failed (only under a strict policy).
    #[error(transparent)]
    Substitute(#[from] SubstituteError),
    /// Reading a cached output file failed.
    #[error("failed to read cached output {}: {source}", path.display())]
    CacheRead {
        /// The output file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Outcome of compiling one document.
#[derive(Debug)]
pub struct CompileResult {
    /// The complete HTML page.
    pub html: String,
    /// Where the output was (or would be) written.
    pub output_path: PathBuf,
    /// Whether the output was served from an up-to-date file on disk.
    pub from_cache: bool,
    /// Front-matter problems encountered during the load, for caller
    /// display. Always `None` on a cache hit.
    pub diagnostic: Option<ParseDiagnostic>,
}

/// Compiles Markdown documents to templated HTML pages.
pub struct Compiler {
    parser: FrontMatterParser,
    substitutor: VariableSubstitutor,
    backend: Box<dyn MarkdownBackend>,
    templates: TemplateResolver,
    template_renderer: TemplateRenderer,
    default_template: String,
    cache_enabled: bool,
}

impl Compiler {
    /// Create a compiler resolving templates from `template_dir`.
    #[must_use]
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            parser: FrontMatterParser::new(),
            substitutor: VariableSubstitutor::new().with_policy(MissingVarPolicy::Warn),
            backend: Box::new(CmarkBackend::new()),
            templates: TemplateResolver::new(template_dir),
            template_renderer: TemplateRenderer::new(),
            default_template: "index".to_owned(),
            cache_enabled: true,
        }
    }

    /// Replace the Markdown backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Box<dyn MarkdownBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Enable or disable the output cache.
    ///
    /// With the cache disabled no output file is read or written; every
    /// call runs the full pipeline.
    #[must_use]
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Template used when neither the caller nor the document names one.
    #[must_use]
    pub fn with_default_template(mut self, name: impl Into<String>) -> Self {
        self.default_template = name.into();
        self
    }

    /// Replace the template discovery patterns.
    #[must_use]
    pub fn with_template_patterns(mut self, patterns: Vec<String>) -> Self {
        self.templates = self.templates.patterns(patterns);
        self
    }

    /// Policy applied when the body references an undefined variable.
    #[must_use]
    pub fn with_missing_var_policy(mut self, policy: MissingVarPolicy) -> Self {
        self.substitutor = VariableSubstitutor::new().with_policy(policy);
        self
    }

    /// Compile `source` to HTML, applying `template` if given.
    ///
    /// Template precedence: the `template` argument, then the document's
    /// `template` metadata key, then the configured default.
    ///
    /// When the cache is enabled and the output file is strictly newer
    /// than the source, the existing output is returned verbatim and no
    /// pipeline stage runs.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if the source cannot be read, the
    /// template cannot be resolved, or substitution fails under a strict
    /// policy. A failure to write the output file is logged and does not
    /// fail the compile.
    pub fn compile(
        &self,
        source: &Path,
        template: Option<&str>,
    ) -> Result<CompileResult, CompileError> {
        let output_path = source.with_extension(OUTPUT_EXTENSION);

        if self.cache_enabled && output_is_fresh(&output_path, source) {
            tracing::debug!(source = %source.display(), "output up to date, skipping compile");
            let html =
                fs::read_to_string(&output_path).map_err(|source| CompileError::CacheRead {
                    path: output_path.clone(),
                    source,
                })?;
            return Ok(CompileResult {
                html,
                output_path,
                from_cache: true,
                diagnostic: None,
            });
        }

        let document = load_document(source, &self.parser)?;
        let context = document.context();

        let body = self.substitutor.substitute(&document.body_text, &context)?;
        let content = self.backend.render(&body);

        let name = template_name(template, &document.metadata, &self.default_template);
        let template_path = self.templates.resolve(&name)?;
        let html = self
            .template_renderer
            .render(&template_path, &with_content(context, &content))?;

        if self.cache_enabled {
            if let Err(e) = write_atomic(&output_path, &html) {
                tracing::warn!(
                    path = %output_path.display(),
                    error = %e,
                    "failed to write compiled output"
                );
            }
        }

        Ok(CompileResult {
            html,
            output_path,
            from_cache: false,
            diagnostic: document.diagnostic,
        })
    }

    /// Load and prepare a document without rendering or templating.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if the source cannot be read or body
    /// substitution fails under a strict policy.
    pub fn load(&self, source: &Path) -> Result<Document, CompileError> {
        let mut document = load_document(source, &self.parser)?;
        let context = document.context();
        document.body_text = self.substitutor.substitute(&document.body_text, &context)?;
        document.rendered_html = Some(self.backend.render(&document.body_text));
        Ok(document)
    }
}

/// Add the rendered HTML under the `content` key.
fn with_content(context: Value, content: &str) -> Value {
    let mut map = match context {
        Value::Mapping(map) => map,
        _ => serde_yaml::Mapping::new(),
    };
    map.insert(Value::from("content"), Value::from(content));
    Value::Mapping(map)
}

/// Whether `output` exists and is strictly newer than `source`.
///
/// Equal timestamps count as stale; filesystems with coarse mtime
/// resolution would otherwise serve output from a write that raced the
/// source edit.
fn output_is_fresh(output: &Path, source: &Path) -> bool {
    let mtime = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (mtime(output), mtime(source)) {
        (Some(out), Some(src)) => out > src,
        _ => false,
    }
}

/// Write `content` to `path` via a temp file in the same directory and an
/// atomic rename.
fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use pretty_assertions::assert_eq;

    use super::*;

    /// A notebook directory with a templates/ subdirectory and one note.
    fn fixture() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let templates = tmp.path().join("templates");
        fs::create_dir(&templates).unwrap();
        fs::write(
            templates.join("index.html"),
            "<title>%meta.title%</title><body>%content%</body>",
        )
        .unwrap();

        let source = tmp.path().join("note.md");
        fs::write(&source, "---\ntitle: My Note\n---\n# Hello\n\nfrom %stem%\n").unwrap();
        (tmp, source)
    }

    /// Backdate a file so later writes are strictly newer.
    fn backdate(path: &Path) {
        let old = SystemTime::now() - Duration::from_secs(3600);
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(old)
            .unwrap();
    }

    #[test]
    fn test_compile_full_pipeline() {
        let (tmp, source) = fixture();
        let compiler = Compiler::new(tmp.path().join("templates"));

        let result = compiler.compile(&source, None).unwrap();

        assert!(!result.from_cache);
        assert!(result.html.contains("<title>My Note</title>"));
        assert!(result.html.contains("<h1>Hello</h1>"));
        assert!(result.html.contains("from note"));
        assert_eq!(result.output_path, tmp.path().join("note.html"));
        assert_eq!(fs::read_to_string(&result.output_path).unwrap(), result.html);
    }

    #[test]
    fn test_compile_cache_hit() {
        let (tmp, source) = fixture();
        backdate(&source);
        let compiler = Compiler::new(tmp.path().join("templates"));

        let first = compiler.compile(&source, None).unwrap();
        assert!(!first.from_cache);

        let second = compiler.compile(&source, None).unwrap();
        assert!(second.from_cache);
        assert_eq!(second.html, first.html);
    }

    #[test]
    fn test_compile_stale_output_recompiled() {
        let (tmp, source) = fixture();
        let output = tmp.path().join("note.html");
        fs::write(&output, "stale").unwrap();
        backdate(&output);
        let compiler = Compiler::new(tmp.path().join("templates"));

        let result = compiler.compile(&source, None).unwrap();

        assert!(!result.from_cache);
        assert!(result.html.contains("<h1>Hello</h1>"));
        assert_eq!(fs::read_to_string(&output).unwrap(), result.html);
    }

    #[test]
    fn test_compile_equal_mtime_counts_as_stale() {
        let (tmp, source) = fixture();
        let output = tmp.path().join("note.html");
        fs::write(&output, "stale").unwrap();
        let stamp = SystemTime::now();
        for path in [&source, &output] {
            fs::File::options()
                .write(true)
                .open(path)
                .unwrap()
                .set_modified(stamp)
                .unwrap();
        }
        let compiler = Compiler::new(tmp.path().join("templates"));

        let result = compiler.compile(&source, None).unwrap();
        assert!(!result.from_cache);
    }

    #[test]
    fn test_compile_cache_disabled_writes_nothing() {
        let (tmp, source) = fixture();
        let compiler = Compiler::new(tmp.path().join("templates")).with_cache_enabled(false);

        let result = compiler.compile(&source, None).unwrap();

        assert!(!result.from_cache);
        assert!(!tmp.path().join("note.html").exists());
        assert!(result.html.contains("<h1>Hello</h1>"));
    }

    #[test]
    fn test_compile_template_from_metadata() {
        let (tmp, _) = fixture();
        fs::write(
            tmp.path().join("templates/special.html"),
            "SPECIAL %content%",
        )
        .unwrap();
        let source = tmp.path().join("styled.md");
        fs::write(&source, "---\ntemplate: special\n---\nbody\n").unwrap();

        let compiler = Compiler::new(tmp.path().join("templates"));
        let result = compiler.compile(&source, None).unwrap();

        assert!(result.html.starts_with("SPECIAL "));
    }

    #[test]
    fn test_compile_explicit_template_wins() {
        let (tmp, _) = fixture();
        fs::write(tmp.path().join("templates/bare.html"), "BARE %content%").unwrap();
        let source = tmp.path().join("styled.md");
        fs::write(&source, "---\ntemplate: index\n---\nbody\n").unwrap();

        let compiler = Compiler::new(tmp.path().join("templates"));
        let result = compiler.compile(&source, Some("bare")).unwrap();

        assert!(result.html.starts_with("BARE "));
    }

    #[test]
    fn test_compile_missing_template_errors() {
        let (tmp, source) = fixture();
        let compiler = Compiler::new(tmp.path().join("templates"))
            .with_default_template("nonexistent");

        let result = compiler.compile(&source, None);
        assert!(matches!(
            result,
            Err(CompileError::Template(TemplateError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_compile_carries_diagnostic() {
        let (tmp, _) = fixture();
        let source = tmp.path().join("broken.md");
        fs::write(&source, "---\ntitle: [unclosed\n---\nbody\n").unwrap();

        let compiler = Compiler::new(tmp.path().join("templates"));
        let result = compiler.compile(&source, None).unwrap();

        assert!(result.diagnostic.is_some());
    }

    #[test]
    fn test_compile_missing_source_errors() {
        let (tmp, _) = fixture();
        let compiler = Compiler::new(tmp.path().join("templates"));

        let result = compiler.compile(&tmp.path().join("absent.md"), None);
        assert!(matches!(result, Err(CompileError::Document(_))));
    }

    #[test]
    fn test_compile_substitutes_metadata_in_body() {
        let (tmp, _) = fixture();
        let source = tmp.path().join("sub.md");
        fs::write(&source, "---\ntitle: T\nauthor: rj\n---\nby %meta.author%\n").unwrap();

        let compiler = Compiler::new(tmp.path().join("templates"));
        let result = compiler.compile(&source, None).unwrap();

        assert!(result.html.contains("by rj"));
    }

    #[test]
    fn test_load_prepares_document() {
        let (tmp, source) = fixture();
        let compiler = Compiler::new(tmp.path().join("templates"));

        let doc = compiler.load(&source).unwrap();

        assert_eq!(
            doc.metadata.get("title").and_then(Value::as_str),
            Some("My Note")
        );
        assert!(doc.body_text.contains("from note"));
        assert!(doc.rendered_html.unwrap().contains("<h1>Hello</h1>"));
    }
}
