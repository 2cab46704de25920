//! Document loading and discovery.
//!
//! A [`Document`] is a source file plus its parsed front matter and the
//! file-derived values ([`FileInfo`]) that variable substitution can
//! reference. Loading never fails on malformed front matter; the
//! resulting diagnostic travels with the document instead.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mdnb_meta::{FrontMatterError, FrontMatterParser, ParseDiagnostic};
use serde_yaml::{Mapping, Value};

/// Error produced while loading or discovering documents.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Reading a source file or directory failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Front-matter parsing failed under a strict policy.
    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),
}

/// Values derived from a document's path, exposed to substitution as
/// top-level variables (`%stem%`, `%dir%`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Directory containing the file.
    pub dir: String,
    /// File name with extension.
    pub basename: String,
    /// File name without extension.
    pub stem: String,
    /// Extension without the dot, empty if none.
    pub ext: String,
    /// Full path as given.
    pub path: String,
    /// Full path with the extension removed.
    pub path_noext: String,
}

impl FileInfo {
    /// Derive file info from a path.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let lossy = |p: Option<&std::ffi::OsStr>| {
            p.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
        };
        Self {
            dir: path
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            basename: lossy(path.file_name()),
            stem: lossy(path.file_stem()),
            ext: lossy(path.extension()),
            path: path.to_string_lossy().into_owned(),
            path_noext: path.with_extension("").to_string_lossy().into_owned(),
        }
    }
}

/// A source file with parsed front matter.
#[derive(Debug)]
pub struct Document {
    /// Path the document was loaded from.
    pub source_path: PathBuf,
    /// The file content exactly as read.
    pub raw_text: String,
    /// Front-matter metadata; empty mapping when the file has none or
    /// parsing failed entirely.
    pub metadata: Mapping,
    /// Markdown body with front matter stripped.
    pub body_text: String,
    /// HTML produced by the pipeline, if it has run.
    pub rendered_html: Option<String>,
    /// Path-derived values.
    pub file_info: FileInfo,
    /// Front-matter problems, `None` when parsing fully succeeded.
    pub diagnostic: Option<ParseDiagnostic>,
}

impl Document {
    /// Build the variable-substitution context for this document.
    ///
    /// Metadata is nested under `meta` (`%meta.title%`); file info keys
    /// are top level (`%stem%`, `%dir%`, `%basename%`, `%ext%`, `%path%`,
    /// `%path_noext%`).
    #[must_use]
    pub fn context(&self) -> Value {
        let mut map = Mapping::new();
        map.insert(
            Value::from("meta"),
            Value::Mapping(self.metadata.clone()),
        );
        map.insert(Value::from("dir"), Value::from(self.file_info.dir.clone()));
        map.insert(
            Value::from("basename"),
            Value::from(self.file_info.basename.clone()),
        );
        map.insert(Value::from("stem"), Value::from(self.file_info.stem.clone()));
        map.insert(Value::from("ext"), Value::from(self.file_info.ext.clone()));
        map.insert(Value::from("path"), Value::from(self.file_info.path.clone()));
        map.insert(
            Value::from("path_noext"),
            Value::from(self.file_info.path_noext.clone()),
        );
        Value::Mapping(map)
    }
}

/// Load a document from disk, parsing its front matter with `parser`.
///
/// # Errors
///
/// Returns [`DocumentError::Io`] if the file cannot be read, or
/// [`DocumentError::FrontMatter`] under a strict parser policy. With the
/// default tolerant parser, front-matter problems never fail the load;
/// they are recorded in [`Document::diagnostic`].
pub fn load_document(path: &Path, parser: &FrontMatterParser) -> Result<Document, DocumentError> {
    let raw_text = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let front = parser.parse(&raw_text)?;
    if let Some(diag) = &front.diagnostic {
        tracing::warn!(path = %path.display(), problems = %diag.summary(), "front matter issues");
    }

    Ok(Document {
        source_path: path.to_path_buf(),
        metadata: front.metadata,
        body_text: front.body,
        rendered_html: None,
        file_info: FileInfo::from_path(path),
        raw_text,
        diagnostic: front.diagnostic,
    })
}

/// Find all document files under `root`, recursively.
///
/// Results are sorted by path. Entries whose names start with a dot are
/// skipped.
///
/// # Errors
///
/// Returns [`DocumentError::Io`] if a directory cannot be listed.
pub fn find_documents(root: &Path, extension: &str) -> Result<Vec<PathBuf>, DocumentError> {
    let mut found = Vec::new();
    collect_documents(root, extension, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect_documents(
    dir: &Path,
    extension: &str,
    found: &mut Vec<PathBuf>,
) -> Result<(), DocumentError> {
    let entries = fs::read_dir(dir).map_err(|source| DocumentError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| DocumentError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            collect_documents(&path, extension, found)?;
        } else if path.extension().is_some_and(|e| e == extension) {
            found.push(path);
        }
    }
    Ok(())
}
