//! Filtered, depth-bounded navigation trees.
//!
//! [`PageTreeBuilder`] enumerates a directory into a [`PathNode`] tree for
//! navigation UI. Directories and files are filtered symmetrically with an
//! include/exclude [`Matcher`] pair each; children are sorted by name so the
//! output is stable across filesystems.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::matcher::Matcher;

/// What part of a path the matchers see.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchTarget {
    /// The basename only (e.g. `notes.md`).
    #[default]
    Name,
    /// The path relative to the tree root (e.g. `2018_Aarhus/notes.md`).
    RelativePath,
    /// The absolute filesystem path.
    AbsolutePath,
}

/// Node kind in a navigation tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A document file; terminal.
    File,
    /// A directory; may have children.
    Folder,
}

/// One node of a navigation tree.
///
/// Never mutated after construction.
#[derive(Debug)]
pub struct PathNode {
    /// File or folder.
    pub kind: NodeKind,
    /// Absolute filesystem path.
    pub path: PathBuf,
    /// Root-relative URL with a leading slash; document extension stripped
    /// for files when the builder is configured to do so.
    pub url_path: String,
    /// Basename.
    pub name: String,
    /// Child nodes, sorted by name. Always empty for files.
    pub children: Vec<PathNode>,
}

/// Builds [`PathNode`] trees from a directory root.
///
/// # Example
///
/// ```no_run
/// use mdnb_paths::{Matcher, PageTreeBuilder};
///
/// let tree = PageTreeBuilder::new("/srv/notebook")
///     .file_include(Matcher::glob("*.md")?)
///     .build(3)?;
/// for child in &tree.children {
///     println!("{}", child.url_path);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct PageTreeBuilder {
    root: PathBuf,
    extension: String,
    strip_extension: bool,
    match_target: MatchTarget,
    exclude_symlinks: bool,
    dir_include: Matcher,
    dir_exclude: Matcher,
    file_include: Matcher,
    file_exclude: Matcher,
}

impl PageTreeBuilder {
    /// Create a builder rooted at `root` with permissive filters.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "md".to_owned(),
            strip_extension: true,
            match_target: MatchTarget::default(),
            exclude_symlinks: false,
            dir_include: Matcher::Always(true),
            dir_exclude: Matcher::Always(false),
            file_include: Matcher::Always(true),
            file_exclude: Matcher::Always(false),
        }
    }

    /// Set the document extension stripped from file URLs.
    #[must_use]
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = ext.into();
        self
    }

    /// Strip the document extension from file URLs.
    #[must_use]
    pub fn strip_extension(mut self, enabled: bool) -> Self {
        self.strip_extension = enabled;
        self
    }

    /// Choose what part of each path the matchers see.
    #[must_use]
    pub fn match_target(mut self, target: MatchTarget) -> Self {
        self.match_target = target;
        self
    }

    /// Exclude symlinks outright, regardless of include rules.
    #[must_use]
    pub fn exclude_symlinks(mut self, enabled: bool) -> Self {
        self.exclude_symlinks = enabled;
        self
    }

    /// Directory include predicate (default: everything).
    #[must_use]
    pub fn dir_include(mut self, matcher: Matcher) -> Self {
        self.dir_include = matcher;
        self
    }

    /// Directory exclude predicate (default: nothing).
    #[must_use]
    pub fn dir_exclude(mut self, matcher: Matcher) -> Self {
        self.dir_exclude = matcher;
        self
    }

    /// File include predicate (default: everything).
    #[must_use]
    pub fn file_include(mut self, matcher: Matcher) -> Self {
        self.file_include = matcher;
        self
    }

    /// File exclude predicate (default: nothing).
    #[must_use]
    pub fn file_exclude(mut self, matcher: Matcher) -> Self {
        self.file_exclude = matcher;
        self
    }

    /// Build the tree down to `depth` levels below the root.
    ///
    /// The depth budget is decremented once per level, bounding total
    /// recursion uniformly rather than per branch. `depth` of zero yields
    /// the bare root node.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if a directory listing fails.
    pub fn build(&self, depth: usize) -> io::Result<PathNode> {
        let children = if depth == 0 {
            Vec::new()
        } else {
            self.children_of(&self.root, depth)?
        };

        Ok(PathNode {
            kind: NodeKind::Folder,
            path: self.root.clone(),
            url_path: "/".to_owned(),
            name: self
                .root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            children,
        })
    }

    fn children_of(&self, dir: &Path, depth: usize) -> io::Result<Vec<PathNode>> {
        let mut entries: Vec<(String, PathBuf, bool, bool)> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push((
                name,
                entry.path(),
                file_type.is_dir(),
                file_type.is_symlink(),
            ));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut nodes = Vec::new();
        for (name, path, is_dir, is_symlink) in entries {
            if self.exclude_symlinks && is_symlink {
                continue;
            }

            let target = self.match_text(&name, &path);
            let kept = if is_dir {
                self.dir_include.matches(&target) && !self.dir_exclude.matches(&target)
            } else {
                self.file_include.matches(&target) && !self.file_exclude.matches(&target)
            };
            if !kept {
                continue;
            }

            if is_dir {
                let children = if depth > 1 {
                    self.children_of(&path, depth - 1)?
                } else {
                    Vec::new()
                };
                nodes.push(PathNode {
                    kind: NodeKind::Folder,
                    url_path: self.url_for(&path, false),
                    path,
                    name,
                    children,
                });
            } else {
                nodes.push(PathNode {
                    kind: NodeKind::File,
                    url_path: self.url_for(&path, true),
                    path,
                    name,
                    children: Vec::new(),
                });
            }
        }
        Ok(nodes)
    }

    fn match_text(&self, name: &str, path: &Path) -> String {
        match self.match_target {
            MatchTarget::Name => name.to_owned(),
            MatchTarget::RelativePath => self.relative_str(path),
            MatchTarget::AbsolutePath => path.to_string_lossy().replace('\\', "/"),
        }
    }

    fn relative_str(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Root-relative URL with a leading slash.
    fn url_for(&self, path: &Path, is_file: bool) -> String {
        let mut rel = self.relative_str(path);
        if is_file && self.strip_extension {
            let suffix = format!(".{}", self.extension);
            if let Some(stripped) = rel.strip_suffix(&suffix) {
                rel = stripped.to_owned();
            }
        }
        format!("/{rel}")
    }
}
