//! CLI command implementations.

pub(crate) mod compile;
pub(crate) mod resolve;
pub(crate) mod tree;

pub(crate) use compile::CompileArgs;
pub(crate) use resolve::ResolveArgs;
pub(crate) use tree::TreeArgs;
