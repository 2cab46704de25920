//! Template lookup and rendering for mdnb.
//!
//! Templates live as plain files in a template directory and are addressed
//! by their extension-stripped basename. [`TemplateResolver`] maps a name to
//! a file by scanning a priority-ordered list of glob patterns; when two
//! patterns match files with the same basename, the later pattern wins.
//! [`TemplateRenderer`] fills a resolved template with a `%dotted.path%`
//! variable context.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mdnb_meta::{MissingVarPolicy, SubstituteError, VariableSubstitutor};
use serde_yaml::Value;

/// Patterns scanned for template files, in priority order.
/// Later patterns override earlier ones for the same basename.
const DEFAULT_PATTERNS: &[&str] = &["*.html", "*.j2.html", "*.j2", "*.tmpl"];

/// Error produced during template resolution or rendering.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// No file in the template directory matches the requested name.
    #[error("no template named {name:?} in {}", dir.display())]
    NotFound {
        /// The requested template name.
        name: String,
        /// The template directory that was scanned.
        dir: PathBuf,
    },
    /// A configured glob pattern is invalid.
    #[error("invalid template pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// Reading a template file failed.
    #[error("failed to read template: {0}")]
    Io(#[from] io::Error),
    /// Placeholder substitution failed (only under a strict policy).
    #[error(transparent)]
    Substitute(#[from] SubstituteError),
}

/// Maps template names to files inside a template directory.
#[derive(Debug)]
pub struct TemplateResolver {
    dir: PathBuf,
    patterns: Vec<String>,
}

impl TemplateResolver {
    /// Create a resolver with the default pattern list.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            patterns: DEFAULT_PATTERNS.iter().map(|&p| p.to_owned()).collect(),
        }
    }

    /// Replace the glob pattern list (priority order, later wins).
    #[must_use]
    pub fn patterns(mut self, patterns: Vec<String>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Build the name → file registry by scanning the template directory.
    ///
    /// The registry is rebuilt on every call so new template files are
    /// picked up without restarts.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Pattern`] if a configured pattern is
    /// invalid.
    pub fn registry(&self) -> Result<BTreeMap<String, PathBuf>, TemplateError> {
        let mut registry = BTreeMap::new();
        for pattern in &self.patterns {
            let full = self.dir.join(pattern);
            let mut paths: Vec<PathBuf> = glob::glob(&full.to_string_lossy())?
                .filter_map(Result::ok)
                .filter(|p| p.is_file())
                .collect();
            paths.sort();
            for path in paths {
                let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned())
                else {
                    continue;
                };
                // Later patterns (and later files within one) override.
                registry.insert(stem, path);
            }
        }
        Ok(registry)
    }

    /// Resolve a template name to its file path.
    ///
    /// The lookup key is the extension-stripped basename, matched
    /// case-sensitively.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] if no scanned file has the
    /// requested basename.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, TemplateError> {
        let registry = self.registry()?;
        tracing::debug!(
            dir = %self.dir.display(),
            count = registry.len(),
            "scanned template directory"
        );
        registry
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound {
                name: name.to_owned(),
                dir: self.dir.clone(),
            })
    }
}

/// Pick the template name to use for a document.
///
/// Precedence: explicit argument, then the metadata `template` key, then
/// the supplied default.
#[must_use]
pub fn template_name(
    explicit: Option<&str>,
    metadata: &serde_yaml::Mapping,
    default: &str,
) -> String {
    if let Some(name) = explicit {
        return name.to_owned();
    }
    metadata
        .get("template")
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_owned()
}

/// Fills template files with a variable context.
///
/// Missing variables are left in place by default; templates routinely
/// reference variables that only some documents define.
pub struct TemplateRenderer {
    substitutor: VariableSubstitutor,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Create a renderer with the ignore-missing policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            substitutor: VariableSubstitutor::new().with_policy(MissingVarPolicy::Ignore),
        }
    }

    /// Override the missing-variable policy.
    #[must_use]
    pub fn with_policy(mut self, policy: MissingVarPolicy) -> Self {
        self.substitutor = VariableSubstitutor::new().with_policy(policy);
        self
    }

    /// Read the template at `path` and substitute `context` into it.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Io`] if the file cannot be read, or
    /// [`TemplateError::Substitute`] under a strict policy.
    pub fn render(&self, path: &Path, context: &Value) -> Result<String, TemplateError> {
        let text = fs::read_to_string(path)?;
        Ok(self.substitutor.substitute(&text, context)?)
    }
}
