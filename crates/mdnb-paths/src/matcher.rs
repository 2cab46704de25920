//! Polymorphic path predicates for tree filtering.

use std::fmt;

/// A predicate over a path string.
///
/// Matchers are constructed once and reused across a traversal. The `Any`
/// variant OR-combines its children in order.
pub enum Matcher {
    /// Constant result regardless of input.
    Always(bool),
    /// True if any child matcher matches (OR semantics).
    Any(Vec<Matcher>),
    /// Glob pattern match against the whole path string.
    Glob(glob::Pattern),
    /// Regular expression search.
    Regex(regex::Regex),
    /// Arbitrary caller-supplied predicate.
    Custom(Box<dyn Fn(&str) -> bool + Send + Sync>),
}

impl Matcher {
    /// Build a glob matcher from a pattern string.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`glob::PatternError`] for invalid patterns.
    pub fn glob(pattern: &str) -> Result<Self, glob::PatternError> {
        Ok(Self::Glob(glob::Pattern::new(pattern)?))
    }

    /// Build a regex matcher from a pattern string.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`regex::Error`] for invalid patterns.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Regex(regex::Regex::new(pattern)?))
    }

    /// Build a matcher from a caller-supplied predicate.
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Box::new(predicate))
    }

    /// Evaluate the matcher against a path string.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Always(value) => *value,
            Self::Any(matchers) => matchers.iter().any(|m| m.matches(path)),
            Self::Glob(pattern) => pattern.matches(path),
            Self::Regex(regex) => regex.is_match(path),
            Self::Custom(predicate) => predicate(path),
        }
    }
}

impl From<bool> for Matcher {
    fn from(value: bool) -> Self {
        Self::Always(value)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always(value) => write!(f, "Always({value})"),
            Self::Any(matchers) => f.debug_tuple("Any").field(matchers).finish(),
            Self::Glob(pattern) => write!(f, "Glob({:?})", pattern.as_str()),
            Self::Regex(regex) => write!(f, "Regex({:?})", regex.as_str()),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
