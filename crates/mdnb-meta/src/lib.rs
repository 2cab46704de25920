//! Front-matter parsing and placeholder substitution for mdnb.
//!
//! Two concerns live here:
//!
//! - [`FrontMatterParser`]: splits raw document text into a YAML metadata
//!   block and a Markdown body. Malformed metadata never aborts the caller's
//!   pipeline; problems are accumulated into a [`ParseDiagnostic`] and the
//!   document degrades to empty metadata.
//! - [`VariableSubstitutor`]: replaces `%dotted.path%` placeholders with
//!   values looked up in a YAML mapping context.

mod frontmatter;
mod substitute;

pub use frontmatter::{
    FrontMatter, FrontMatterError, FrontMatterParser, ParseDiagnostic, Strictness,
};
pub use substitute::{MissingVarPolicy, SubstituteError, VariableSubstitutor, lookup_dotted};
