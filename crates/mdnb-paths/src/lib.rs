//! Abbreviated path resolution and navigation trees for mdnb.
//!
//! Notebook URLs are allowed to abbreviate directory and file names: each
//! path segment only needs to be a prefix of the real name. This crate
//! expands such paths against a document root ([`PathResolver`]), picks a
//! representative document for directories ([`IndexFileSelector`]), and
//! builds filtered, depth-bounded navigation trees ([`PageTreeBuilder`]).

mod matcher;
mod resolve;
mod tree;

pub use matcher::Matcher;
pub use resolve::{IndexFileSelector, PathResolver, ResolveError};
pub use tree::{MatchTarget, NodeKind, PageTreeBuilder, PathNode};
