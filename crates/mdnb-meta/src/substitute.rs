//! `%dotted.path%` placeholder substitution.
//!
//! Placeholders are case-sensitive, non-nesting, and resolved against a YAML
//! mapping context via dotted key traversal. Substitution is a single pass
//! over the distinct placeholders found in the input; a substituted value is
//! never itself re-scanned for placeholders.

use std::borrow::Cow;
use std::collections::BTreeMap;

use regex::Regex;
use serde_yaml::Value;

/// Placeholder syntax: `%identifier(.identifier)*%`.
const PLACEHOLDER_PATTERN: &str = r"%([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)%";

/// What to do when a placeholder has no value in the context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingVarPolicy {
    /// Abort substitution with [`SubstituteError::MissingVariable`].
    Error,
    /// Log a warning and leave the placeholder untouched.
    #[default]
    Warn,
    /// Silently leave the placeholder untouched.
    Ignore,
}

/// Error raised for unresolved placeholders under [`MissingVarPolicy::Error`].
#[derive(Debug, thiserror::Error)]
pub enum SubstituteError {
    /// A placeholder had no value in the context.
    #[error("unresolved placeholder %{0}%")]
    MissingVariable(String),
}

/// Resolve a dotted path (`meta.author.name`) against a YAML value.
///
/// Each segment indexes into a mapping by string key. Returns `None` as soon
/// as a segment is missing or the current value is not a mapping.
#[must_use]
pub fn lookup_dotted<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_mapping()?.get(segment)?;
    }
    Some(current)
}

/// Replaces `%dotted.path%` placeholders with context values.
///
/// # Example
///
/// ```
/// use mdnb_meta::VariableSubstitutor;
///
/// let context = serde_yaml::from_str(r#"{meta: {title: Demo}}"#).unwrap();
/// let substitutor = VariableSubstitutor::new();
/// let out = substitutor.substitute("# %meta.title%", &context).unwrap();
/// assert_eq!(out, "# Demo");
/// ```
pub struct VariableSubstitutor {
    pattern: Regex,
    policy: MissingVarPolicy,
}

impl Default for VariableSubstitutor {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableSubstitutor {
    /// Create a substitutor with the default warn-and-skip policy.
    ///
    /// # Panics
    ///
    /// Panics if the placeholder regex fails to compile. This should never
    /// happen as the pattern is a compile-time constant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(PLACEHOLDER_PATTERN).unwrap(),
            policy: MissingVarPolicy::default(),
        }
    }

    /// Set the missing-value policy.
    #[must_use]
    pub fn with_policy(mut self, policy: MissingVarPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Substitute all placeholders in `text` against `context`.
    ///
    /// # Errors
    ///
    /// Returns [`SubstituteError::MissingVariable`] for the first unresolved
    /// placeholder when the policy is [`MissingVarPolicy::Error`]. Under the
    /// other policies the call always succeeds and unresolved placeholders
    /// are left verbatim in the output.
    pub fn substitute(&self, text: &str, context: &Value) -> Result<String, SubstituteError> {
        // Resolve every distinct placeholder up front so the policy applies
        // per variable, not per occurrence.
        let mut resolved: BTreeMap<&str, Option<String>> = BTreeMap::new();
        for caps in self.pattern.captures_iter(text) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            resolved
                .entry(name)
                .or_insert_with(|| lookup_dotted(context, name).map(format_value));
        }

        for (name, value) in &resolved {
            if value.is_none() {
                match self.policy {
                    MissingVarPolicy::Error => {
                        return Err(SubstituteError::MissingVariable((*name).to_owned()));
                    }
                    MissingVarPolicy::Warn => {
                        tracing::warn!(variable = %name, "no value for placeholder");
                    }
                    MissingVarPolicy::Ignore => {}
                }
            }
        }

        let output = self.pattern.replace_all(text, |caps: &regex::Captures<'_>| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            match resolved.get(name) {
                Some(Some(value)) => Cow::Owned(value.clone()),
                // Unresolved: keep the placeholder text as-is.
                _ => Cow::Owned(caps[0].to_owned()),
            }
        });

        Ok(output.into_owned())
    }
}

/// Render a YAML value for inline substitution.
///
/// Strings are inserted bare; other scalars use their natural text form;
/// sequences and mappings render as compact JSON (valid YAML flow style).
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
