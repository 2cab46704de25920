//! Document model and compilation pipeline for mdnb.
//!
//! [`Document`] couples a source file with its parsed front matter and
//! derived file info. [`Compiler`] drives the full pipeline: staleness
//! check against the compiled output, front-matter parse, variable
//! substitution, Markdown rendering, and template application, finishing
//! with an atomic replace of the output file.

mod compiler;
mod document;

pub use compiler::{CompileError, CompileResult, Compiler};
pub use document::{Document, DocumentError, FileInfo, find_documents, load_document};
