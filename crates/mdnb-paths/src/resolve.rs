//! Abbreviated path expansion and index-file selection.
//!
//! A request path like `2018/RS532` is expanded segment by segment against
//! the document root: `2018` may match a directory `2018_Aarhus`, and
//! `RS532` a directory `RS532_Test_experiment`, whose index document is then
//! selected. Directory listings are sorted lexicographically before prefix
//! matching so resolution is deterministic across filesystems.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Error produced during path resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A segment matched nothing, exactly or by prefix.
    #[error("no expansion for segment {segment:?} under {}", cursor.display())]
    NoExpansion {
        /// The abbreviated segment that failed.
        segment: String,
        /// The directory the resolver was looking in.
        cursor: PathBuf,
    },
    /// A directory has no eligible document to serve as its index.
    #[error("no index document in directory {}", .0.display())]
    NoIndexFile(PathBuf),
    /// The normalized result left the configured root.
    #[error("resolved path {} escapes the document root {}", path.display(), root.display())]
    OutsideRoot {
        /// The escaping path.
        path: PathBuf,
        /// The configured root.
        root: PathBuf,
    },
    /// Underlying filesystem failure.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// Picks the document that represents a directory.
///
/// Selection order: a conventional `index` document, then a file whose stem
/// exactly equals the directory name, then the file whose stem shares the
/// longest common prefix with the directory name.
#[derive(Debug)]
pub struct IndexFileSelector {
    extension: String,
    index_name: String,
    strip_extension: bool,
}

impl Default for IndexFileSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexFileSelector {
    /// Create a selector for `.md` documents with `index` as the
    /// conventional name.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extension: "md".to_owned(),
            index_name: "index".to_owned(),
            strip_extension: false,
        }
    }

    /// Set the document extension (without leading dot).
    #[must_use]
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = ext.into();
        self
    }

    /// Set the conventional index document name (without extension).
    #[must_use]
    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = name.into();
        self
    }

    /// Strip the extension from the returned filename.
    #[must_use]
    pub fn strip_extension(mut self, strip: bool) -> Self {
        self.strip_extension = strip;
        self
    }

    /// Choose the index document for `dir`, returning its filename.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoIndexFile`] when the directory contains no
    /// document with the configured extension, or none shares a prefix with
    /// the directory name. I/O failures map to [`ResolveError::Io`].
    pub fn select(&self, dir: &Path) -> Result<String, ResolveError> {
        let suffix = format!(".{}", self.extension);
        let files = list_sorted(dir)?
            .into_iter()
            .filter(|name| name.ends_with(&suffix) && dir.join(name).is_file())
            .collect::<Vec<_>>();

        if files.is_empty() {
            return Err(ResolveError::NoIndexFile(dir.to_path_buf()));
        }

        let index_file = format!("{}{suffix}", self.index_name);
        let found = if files.iter().any(|name| *name == index_file) {
            index_file
        } else {
            let dir_name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let exact: Vec<&String> = files
                .iter()
                .filter(|name| stem_of(name, &suffix) == dir_name)
                .collect();
            if let Some(first) = exact.first() {
                if exact.len() > 1 {
                    // More than one exact stem match breaks the directory
                    // contract; keep serving with the first.
                    tracing::warn!(
                        dir = %dir.display(),
                        count = exact.len(),
                        "multiple documents share the directory name"
                    );
                }
                (*first).clone()
            } else {
                // Score by longest common prefix; ties break toward the
                // lexicographically first name (files are sorted).
                let mut best_score = 0;
                let mut best: Option<&String> = None;
                for name in &files {
                    let score = common_prefix_len(stem_of(name, &suffix), &dir_name);
                    if score > best_score {
                        best_score = score;
                        best = Some(name);
                    }
                }
                match best {
                    Some(name) => name.clone(),
                    None => return Err(ResolveError::NoIndexFile(dir.to_path_buf())),
                }
            }
        };

        if self.strip_extension {
            Ok(found
                .strip_suffix(&suffix)
                .map_or(found.clone(), ToOwned::to_owned))
        } else {
            Ok(found)
        }
    }
}

/// Expands abbreviated request paths against a document root.
///
/// Each slash-separated segment must exist exactly or be a prefix of a
/// sibling name. Among prefix candidates a document file wins over a
/// directory; remaining ties break by sorted listing order. Resolution never
/// backtracks: a segment with no candidate fails the whole path.
///
/// # Example
///
/// ```no_run
/// use mdnb_paths::PathResolver;
///
/// let resolver = PathResolver::new("/srv/notebook");
/// let expanded = resolver.resolve("2018/RS532")?;
/// // e.g. "2018_Aarhus/RS532_Test_experiment/RS532"
/// # Ok::<(), mdnb_paths::ResolveError>(())
/// ```
#[derive(Debug)]
pub struct PathResolver {
    root: PathBuf,
    extension: String,
    resolve_index: bool,
    strip_extension: bool,
    relative_to_root: bool,
    forward_slashes: bool,
}

impl PathResolver {
    /// Create a resolver for `.md` documents rooted at `root`.
    ///
    /// Defaults: directory terminals resolve to their index document, the
    /// document extension is stripped, and the result is returned relative
    /// to the root with forward slashes.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize_lexical(&root.into()),
            extension: "md".to_owned(),
            resolve_index: true,
            strip_extension: true,
            relative_to_root: true,
            forward_slashes: true,
        }
    }

    /// Set the document extension (without leading dot).
    #[must_use]
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = ext.into();
        self
    }

    /// Resolve directory terminals to their index document.
    #[must_use]
    pub fn resolve_index(mut self, enabled: bool) -> Self {
        self.resolve_index = enabled;
        self
    }

    /// Strip the document extension from the result.
    #[must_use]
    pub fn strip_extension(mut self, enabled: bool) -> Self {
        self.strip_extension = enabled;
        self
    }

    /// Return the result relative to the root rather than absolute.
    #[must_use]
    pub fn relative_to_root(mut self, enabled: bool) -> Self {
        self.relative_to_root = enabled;
        self
    }

    /// Normalize path separators to forward slashes.
    #[must_use]
    pub fn forward_slashes(mut self, enabled: bool) -> Self {
        self.forward_slashes = enabled;
        self
    }

    /// Expand the abbreviated `path` to a concrete path string.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NoExpansion`] when a segment has no exact or prefix
    ///   match.
    /// - [`ResolveError::NoIndexFile`] when the terminal directory has no
    ///   index document (only with index resolution enabled).
    /// - [`ResolveError::OutsideRoot`] when the normalized result escapes
    ///   the root.
    pub fn resolve(&self, path: &str) -> Result<String, ResolveError> {
        let mut cursor = self.root.clone();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let exact = cursor.join(segment);
            if exact.exists() {
                cursor = exact;
            } else {
                cursor = self.expand_segment(&cursor, segment)?;
                tracing::debug!(segment, expanded = %cursor.display(), "expanded abbreviated segment");
            }
        }

        if self.resolve_index && cursor.is_dir() {
            let selector = IndexFileSelector::new().extension(self.extension.clone());
            let index = selector.select(&cursor)?;
            cursor = cursor.join(index);
        }

        let mut result = normalize_lexical(&cursor);
        if !result.starts_with(&self.root) {
            return Err(ResolveError::OutsideRoot {
                path: result,
                root: self.root.clone(),
            });
        }

        if self.strip_extension {
            result = strip_path_extension(&result, &self.extension);
        }
        if self.relative_to_root {
            result = result
                .strip_prefix(&self.root)
                .map(Path::to_path_buf)
                .unwrap_or(result);
        }

        let mut out = result.to_string_lossy().into_owned();
        if self.forward_slashes {
            out = out.replace('\\', "/");
        }
        Ok(out)
    }

    /// Expand one abbreviated segment by prefix-matching the cursor's
    /// children.
    fn expand_segment(&self, cursor: &Path, segment: &str) -> Result<PathBuf, ResolveError> {
        let no_expansion = || ResolveError::NoExpansion {
            segment: segment.to_owned(),
            cursor: cursor.to_path_buf(),
        };

        if !cursor.is_dir() {
            return Err(no_expansion());
        }

        let suffix = format!(".{}", self.extension);
        let candidates: Vec<String> = list_sorted(cursor)?
            .into_iter()
            .filter(|name| name.starts_with(segment))
            .collect();

        // A document file beats a directory; ties break by sorted order.
        if let Some(file) = candidates
            .iter()
            .find(|name| name.ends_with(&suffix) && cursor.join(name).is_file())
        {
            return Ok(cursor.join(file));
        }
        if let Some(dir) = candidates.iter().find(|name| cursor.join(name).is_dir()) {
            return Ok(cursor.join(dir));
        }

        Err(no_expansion())
    }
}

/// List a directory's child names in lexicographic order.
fn list_sorted(dir: &Path) -> Result<Vec<String>, ResolveError> {
    let entries = fs::read_dir(dir).map_err(|source| ResolveError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}

/// Resolve `.` and `..` components lexically, without touching the
/// filesystem.
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Strip a trailing `.{ext}` from the path's file name, if present.
fn strip_path_extension(path: &Path, ext: &str) -> PathBuf {
    let suffix = format!(".{ext}");
    match path.file_name().map(|n| n.to_string_lossy()) {
        Some(name) if name.ends_with(&suffix) => {
            let stem = name[..name.len() - suffix.len()].to_owned();
            path.with_file_name(stem)
        }
        _ => path.to_path_buf(),
    }
}

fn stem_of<'a>(name: &'a str, suffix: &str) -> &'a str {
    name.strip_suffix(suffix).unwrap_or(name)
}

/// Length of the longest common prefix of two strings, in characters.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};

    use super::*;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    /// Notebook fixture:
    /// ```text
    /// root/
    /// +-- 2018_Aarhus/
    /// |   +-- RS532_Test_experiment/
    /// |   |   +-- README.md  RS532.md  RS532a.md  RS.md
    /// |   +-- notes.md
    /// +-- 2019_Turin/
    ///     +-- index.md  summary.md
    /// ```
    fn notebook() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();

        let exp = root.join("2018_Aarhus/RS532_Test_experiment");
        fs::create_dir_all(&exp).unwrap();
        for name in ["README.md", "RS532.md", "RS532a.md", "RS.md"] {
            touch(&exp.join(name));
        }
        touch(&root.join("2018_Aarhus/notes.md"));

        let turin = root.join("2019_Turin");
        fs::create_dir_all(&turin).unwrap();
        touch(&turin.join("index.md"));
        touch(&turin.join("summary.md"));

        tmp
    }

    // IndexFileSelector

    #[test]
    fn test_select_longest_common_prefix() {
        let tmp = notebook();
        let dir = tmp.path().join("2018_Aarhus/RS532_Test_experiment");

        let selector = IndexFileSelector::new();
        assert_eq!(selector.select(&dir).unwrap(), "RS532.md");
    }

    #[test]
    fn test_select_prefers_index_file() {
        let tmp = notebook();
        let dir = tmp.path().join("2019_Turin");

        let selector = IndexFileSelector::new();
        assert_eq!(selector.select(&dir).unwrap(), "index.md");
    }

    #[test]
    fn test_select_exact_stem_match() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("RS532");
        fs::create_dir(&dir).unwrap();
        touch(&dir.join("RS532.md"));
        touch(&dir.join("other.md"));

        let selector = IndexFileSelector::new();
        assert_eq!(selector.select(&dir).unwrap(), "RS532.md");
    }

    #[test]
    fn test_select_strips_extension() {
        let tmp = notebook();
        let dir = tmp.path().join("2019_Turin");

        let selector = IndexFileSelector::new().strip_extension(true);
        assert_eq!(selector.select(&dir).unwrap(), "index");
    }

    #[test]
    fn test_select_no_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("empty");
        fs::create_dir(&dir).unwrap();
        touch(&dir.join("data.csv"));

        let selector = IndexFileSelector::new();
        assert!(matches!(
            selector.select(&dir),
            Err(ResolveError::NoIndexFile(_))
        ));
    }

    #[test]
    fn test_select_zero_overlap_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("experiment");
        fs::create_dir(&dir).unwrap();
        touch(&dir.join("unrelated.md"));

        let selector = IndexFileSelector::new();
        assert!(matches!(
            selector.select(&dir),
            Err(ResolveError::NoIndexFile(_))
        ));
    }

    // PathResolver

    #[test]
    fn test_resolve_exact_path_identity() {
        let tmp = notebook();
        let resolver = PathResolver::new(tmp.path())
            .resolve_index(false)
            .strip_extension(false);

        assert_eq!(
            resolver.resolve("2018_Aarhus/notes.md").unwrap(),
            "2018_Aarhus/notes.md"
        );
    }

    #[test]
    fn test_resolve_unique_prefix() {
        let tmp = notebook();
        let resolver = PathResolver::new(tmp.path())
            .resolve_index(false)
            .strip_extension(false);

        assert_eq!(resolver.resolve("2019").unwrap(), "2019_Turin");
    }

    #[test]
    fn test_resolve_abbreviated_chain_with_index() {
        let tmp = notebook();
        let resolver = PathResolver::new(tmp.path());

        assert_eq!(
            resolver.resolve("2018/RS532").unwrap(),
            "2018_Aarhus/RS532_Test_experiment/RS532"
        );
    }

    #[test]
    fn test_resolve_file_preferred_over_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir(root.join("report_dir")).unwrap();
        touch(&root.join("report.md"));

        let resolver = PathResolver::new(root)
            .resolve_index(false)
            .strip_extension(false);
        assert_eq!(resolver.resolve("rep").unwrap(), "report.md");
    }

    #[test]
    fn test_resolve_no_candidates() {
        let tmp = notebook();
        let resolver = PathResolver::new(tmp.path());

        let result = resolver.resolve("2020/whatever");
        assert!(matches!(
            result,
            Err(ResolveError::NoExpansion { segment, .. }) if segment == "2020"
        ));
    }

    #[test]
    fn test_resolve_failure_does_not_backtrack() {
        let tmp = notebook();
        let resolver = PathResolver::new(tmp.path());

        // "2018" expands but "zz" matches nothing inside it; no sibling
        // branch is searched.
        let result = resolver.resolve("2018/zz");
        assert!(matches!(
            result,
            Err(ResolveError::NoExpansion { segment, .. }) if segment == "zz"
        ));
    }

    #[test]
    fn test_resolve_parent_escape_rejected() {
        let tmp = notebook();
        let root = tmp.path().join("2018_Aarhus");
        let resolver = PathResolver::new(&root).resolve_index(false);

        let result = resolver.resolve("../2019_Turin/summary.md");
        assert!(matches!(result, Err(ResolveError::OutsideRoot { .. })));
    }

    #[test]
    fn test_resolve_absolute_output() {
        let tmp = notebook();
        let resolver = PathResolver::new(tmp.path())
            .resolve_index(false)
            .strip_extension(false)
            .relative_to_root(false);

        let out = resolver.resolve("2018_Aarhus/notes.md").unwrap();
        assert!(out.ends_with("2018_Aarhus/notes.md"));
        assert!(Path::new(&out).is_absolute());
    }

    #[test]
    fn test_resolve_strips_extension() {
        let tmp = notebook();
        let resolver = PathResolver::new(tmp.path()).resolve_index(false);

        assert_eq!(
            resolver.resolve("2018_Aarhus/notes.md").unwrap(),
            "2018_Aarhus/notes"
        );
    }

    // helpers

    #[test]
    fn test_common_prefix_len() {
        assert_eq!(common_prefix_len("RS532", "RS532_Test_experiment"), 5);
        assert_eq!(common_prefix_len("README", "RS532"), 1);
        assert_eq!(common_prefix_len("abc", "xyz"), 0);
    }

    #[test]
    fn test_normalize_lexical() {
        assert_eq!(
            normalize_lexical(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
    }
}
