//! YAML front-matter extraction with diagnostic recovery.
//!
//! Documents carry an optional metadata block at the top, delimited by
//! standalone lines of three or more dashes:
//!
//! ```text
//! ---
//! title: My page
//! ---
//! Body text.
//! ```
//!
//! Parsing is tolerant by default: structural problems (a single delimiter,
//! content before the first delimiter, YAML that fails to load) are recorded
//! into a [`ParseDiagnostic`] and the document proceeds with whatever could
//! be salvaged. Callers that want hard failures opt into
//! [`Strictness::Strict`] per condition.

use regex::Regex;
use serde_yaml::{Mapping, Value};

/// Default delimiter: a standalone line of three or more dashes.
const DEFAULT_DELIMITER: &str = r"(?m)^-{3,}[ \t]*$";

/// How many context lines to reproduce around a YAML error location.
const ERROR_CONTEXT_LINES: usize = 2;

/// Policy for a recoverable front-matter condition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Abort parsing with a [`FrontMatterError`].
    Strict,
    /// Record a diagnostic and continue.
    #[default]
    Tolerant,
}

/// Error returned when a strict-mode condition fires.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    /// Only one delimiter line was found, making the split ambiguous.
    #[error("only one front-matter delimiter found; metadata block is ambiguous")]
    SingleDelimiter,
    /// Text precedes the first delimiter line.
    #[error("unexpected content before the first front-matter delimiter")]
    NonEmptyPreamble,
}

/// Accumulated sub-failures from a tolerant parse.
///
/// A parse can fail in more than one way (e.g. a missing leading marker
/// *and* unloadable YAML); each failure appends a message, an optional
/// human-readable detail block, and the underlying error where one exists.
#[derive(Debug, Default)]
pub struct ParseDiagnostic {
    messages: Vec<String>,
    details: Vec<String>,
    causes: Vec<Box<dyn std::error::Error + Send + Sync>>,
}

impl ParseDiagnostic {
    fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
        self.details.push(String::new());
    }

    fn push_with_detail(
        &mut self,
        message: impl Into<String>,
        detail: String,
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) {
        self.messages.push(message.into());
        self.details.push(detail);
        if let Some(cause) = cause {
            self.causes.push(cause);
        }
    }

    /// True if no failures were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Recorded messages, in order of occurrence.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Detail blocks, parallel to [`messages`](Self::messages).
    /// Empty string where a failure had no extra detail.
    #[must_use]
    pub fn details(&self) -> &[String] {
        &self.details
    }

    /// Underlying errors for failures that had one.
    #[must_use]
    pub fn causes(&self) -> &[Box<dyn std::error::Error + Send + Sync>] {
        &self.causes
    }

    /// All messages joined for single-line display.
    #[must_use]
    pub fn summary(&self) -> String {
        self.messages.join(" | ")
    }

    /// All non-empty detail blocks joined for multi-line display.
    #[must_use]
    pub fn detail(&self) -> String {
        self.details
            .iter()
            .filter(|d| !d.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n------\n")
    }

    fn into_option(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

/// Result of splitting a document into metadata and body.
#[derive(Debug)]
pub struct FrontMatter {
    /// Parsed metadata. Empty mapping when parsing failed.
    pub metadata: Mapping,
    /// Body text. Falls back to the raw input on total failure.
    pub body: String,
    /// `None` exactly when parsing fully succeeded.
    pub diagnostic: Option<ParseDiagnostic>,
}

/// Splits raw document text into a metadata block and body.
///
/// # Example
///
/// ```
/// use mdnb_meta::FrontMatterParser;
///
/// let parser = FrontMatterParser::new();
/// let fm = parser.parse("---\ntitle: Demo\n---\nBody").unwrap();
/// assert_eq!(fm.body, "Body");
/// assert!(fm.diagnostic.is_none());
/// ```
pub struct FrontMatterParser {
    delimiter: Regex,
    single_delimiter: Strictness,
    nonempty_preamble: Strictness,
}

impl Default for FrontMatterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrontMatterParser {
    /// Create a parser with the default `---` delimiter and tolerant policies.
    ///
    /// # Panics
    ///
    /// Panics if the built-in delimiter regex fails to compile. This should
    /// never happen as the pattern is a compile-time constant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delimiter: Regex::new(DEFAULT_DELIMITER).unwrap(),
            single_delimiter: Strictness::Tolerant,
            nonempty_preamble: Strictness::Tolerant,
        }
    }

    /// Use a custom delimiter line pattern.
    ///
    /// The pattern is applied in multi-line mode against the whole document,
    /// so anchor it with `^`/`$` to match full lines.
    pub fn with_delimiter(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.delimiter = Regex::new(&format!("(?m){pattern}"))?;
        Ok(self)
    }

    /// Policy for documents with exactly one delimiter line.
    #[must_use]
    pub fn single_delimiter(mut self, policy: Strictness) -> Self {
        self.single_delimiter = policy;
        self
    }

    /// Policy for non-empty text before the first delimiter.
    #[must_use]
    pub fn nonempty_preamble(mut self, policy: Strictness) -> Self {
        self.nonempty_preamble = policy;
        self
    }

    /// Split `raw` into metadata and body.
    ///
    /// # Errors
    ///
    /// Returns [`FrontMatterError`] only when a condition configured as
    /// [`Strictness::Strict`] fires. Under tolerant policies the call always
    /// succeeds and failures are reported via [`FrontMatter::diagnostic`].
    pub fn parse(&self, raw: &str) -> Result<FrontMatter, FrontMatterError> {
        let mut diagnostic = ParseDiagnostic::new();

        // Split at most twice: preamble, metadata block, body.
        let parts: Vec<&str> = self.delimiter.splitn(raw, 3).collect();

        let (yaml_text, body) = match parts.as_slice() {
            [_] => {
                diagnostic.push(format!(
                    "No front-matter delimiter ({:?}) found in document",
                    self.delimiter.as_str()
                ));
                return Ok(FrontMatter {
                    metadata: Mapping::new(),
                    body: raw.to_owned(),
                    diagnostic: diagnostic.into_option(),
                });
            }
            [first, rest] => {
                // One delimiter: is `first` a preamble or the metadata block?
                if self.single_delimiter == Strictness::Strict {
                    return Err(FrontMatterError::SingleDelimiter);
                }
                diagnostic.push("Only one front-matter delimiter found");
                (*first, *rest)
            }
            [preamble, yaml_text, body] => {
                if !preamble.trim().is_empty() {
                    if self.nonempty_preamble == Strictness::Strict {
                        return Err(FrontMatterError::NonEmptyPreamble);
                    }
                    diagnostic
                        .push("Content before the first front-matter delimiter was discarded");
                }
                (*yaml_text, *body)
            }
            _ => unreachable!("splitn(_, 3) yields at most three parts"),
        };

        let body = body.strip_prefix('\n').unwrap_or(body).to_owned();

        if yaml_text.trim().is_empty() {
            diagnostic.push("Front-matter block is empty");
            return Ok(FrontMatter {
                metadata: Mapping::new(),
                body,
                diagnostic: diagnostic.into_option(),
            });
        }

        match serde_yaml::from_str::<Value>(yaml_text) {
            Ok(Value::Mapping(metadata)) => Ok(FrontMatter {
                metadata,
                body,
                diagnostic: diagnostic.into_option(),
            }),
            Ok(other) => {
                diagnostic.push(format!(
                    "Front matter did not parse to a mapping (got {})",
                    value_kind(&other)
                ));
                Ok(FrontMatter {
                    metadata: Mapping::new(),
                    body,
                    diagnostic: diagnostic.into_option(),
                })
            }
            Err(err) => {
                let detail = yaml_error_detail(yaml_text, &err);
                diagnostic.push_with_detail(
                    format!("Failed to load front-matter YAML: {err}"),
                    detail,
                    Some(Box::new(err)),
                );
                // Degrade hard: empty metadata, and the body reverts to the
                // full raw input so nothing the author wrote is lost.
                Ok(FrontMatter {
                    metadata: Mapping::new(),
                    body: raw.to_owned(),
                    diagnostic: diagnostic.into_option(),
                })
            }
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Build a human-readable detail block for a YAML load failure.
///
/// Reproduces the offending lines with whitespace made visible (`⭾` for TAB,
/// `·` for SPACE), marks the failing line, and reports lines with trailing
/// whitespace — the most common cause of YAML scanner errors in hand-written
/// metadata.
fn yaml_error_detail(yaml_text: &str, err: &serde_yaml::Error) -> String {
    let lines: Vec<&str> = yaml_text.lines().collect();
    let mut out = String::new();

    if let Some(location) = err.location() {
        // location().line() is 1-based.
        let line_idx = location.line().saturating_sub(1);
        let start = line_idx.saturating_sub(ERROR_CONTEXT_LINES);
        let stop = (line_idx + ERROR_CONTEXT_LINES + 1).min(lines.len());

        out.push_str(&format!(
            "Problem at line {}, column {} (⭾ and · show TAB and SPACE):\n",
            location.line(),
            location.column()
        ));
        for (i, line) in lines.iter().enumerate().take(stop).skip(start) {
            let visible = line.replace('\t', "⭾").replace(' ', "·");
            if i == line_idx {
                out.push_str(&format!("  {visible}    ⚠\n"));
            } else {
                out.push_str(&format!("  {visible}\n"));
            }
        }
    } else {
        out.push_str("Problem location unknown; full block (⭾ and · show TAB and SPACE):\n");
        for line in &lines {
            let visible = line.replace('\t', "⭾").replace(' ', "·");
            out.push_str(&format!("  {visible}\n"));
        }
    }

    let trailing: Vec<String> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.ends_with([' ', '\t']))
        .map(|(i, _)| (i + 1).to_string())
        .collect();
    if trailing.is_empty() {
        out.push_str("Lines with trailing whitespace: none.");
    } else {
        out.push_str(&format!(
            "Lines with trailing whitespace: {}.",
            trailing.join(", ")
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_round_trip() {
        let parser = FrontMatterParser::new();
        let fm = parser.parse("---\nk: v\n---\nBODY").unwrap();

        assert_eq!(fm.metadata.get("k"), Some(&Value::from("v")));
        assert_eq!(fm.body, "BODY");
        assert!(fm.diagnostic.is_none());
    }

    #[test]
    fn test_parse_multiple_keys_and_nesting() {
        let parser = FrontMatterParser::new();
        let raw = "---\ntitle: Demo\nauthor:\n  name: Rosalind\n---\n# Heading\n";
        let fm = parser.parse(raw).unwrap();

        assert_eq!(fm.metadata.get("title"), Some(&Value::from("Demo")));
        let author = fm.metadata.get("author").unwrap();
        assert_eq!(
            author.get("name").and_then(Value::as_str),
            Some("Rosalind")
        );
        assert_eq!(fm.body, "# Heading\n");
        assert!(fm.diagnostic.is_none());
    }

    #[test]
    fn test_parse_longer_delimiter_lines() {
        let parser = FrontMatterParser::new();
        let fm = parser.parse("-----\nk: v\n-------\nBODY").unwrap();

        assert_eq!(fm.metadata.get("k"), Some(&Value::from("v")));
        assert_eq!(fm.body, "BODY");
        assert!(fm.diagnostic.is_none());
    }

    #[test]
    fn test_parse_no_delimiter() {
        let parser = FrontMatterParser::new();
        let fm = parser.parse("Just a plain document.\n").unwrap();

        assert!(fm.metadata.is_empty());
        assert_eq!(fm.body, "Just a plain document.\n");
        let diagnostic = fm.diagnostic.expect("missing delimiter is diagnosed");
        assert!(!diagnostic.messages().is_empty());
    }

    #[test]
    fn test_parse_single_delimiter_tolerant() {
        let parser = FrontMatterParser::new();
        let fm = parser.parse("k: v\n---\nBODY").unwrap();

        // The text before the lone delimiter is treated as metadata.
        assert_eq!(fm.metadata.get("k"), Some(&Value::from("v")));
        assert_eq!(fm.body, "BODY");
        assert!(fm.diagnostic.is_some());
    }

    #[test]
    fn test_parse_single_delimiter_strict() {
        let parser = FrontMatterParser::new().single_delimiter(Strictness::Strict);
        let result = parser.parse("k: v\n---\nBODY");

        assert!(matches!(result, Err(FrontMatterError::SingleDelimiter)));
    }

    #[test]
    fn test_parse_nonempty_preamble_tolerant() {
        let parser = FrontMatterParser::new();
        let fm = parser.parse("stray text\n---\nk: v\n---\nBODY").unwrap();

        assert_eq!(fm.metadata.get("k"), Some(&Value::from("v")));
        assert_eq!(fm.body, "BODY");
        assert!(fm.diagnostic.is_some());
    }

    #[test]
    fn test_parse_nonempty_preamble_strict() {
        let parser = FrontMatterParser::new().nonempty_preamble(Strictness::Strict);
        let result = parser.parse("stray text\n---\nk: v\n---\nBODY");

        assert!(matches!(result, Err(FrontMatterError::NonEmptyPreamble)));
    }

    #[test]
    fn test_parse_empty_metadata_block() {
        let parser = FrontMatterParser::new();
        let fm = parser.parse("---\n\n---\nBODY").unwrap();

        assert!(fm.metadata.is_empty());
        assert_eq!(fm.body, "BODY");
        assert!(fm.diagnostic.is_some());
    }

    #[test]
    fn test_parse_malformed_yaml_degrades() {
        let parser = FrontMatterParser::new();
        let raw = "---\ntitle: [unclosed\nother: {bad\n---\nBODY";
        let fm = parser.parse(raw).unwrap();

        assert!(fm.metadata.is_empty());
        // Body falls back to the untouched input.
        assert_eq!(fm.body, raw);

        let diagnostic = fm.diagnostic.expect("YAML failure must be diagnosed");
        assert!(!diagnostic.messages().is_empty());
        assert_eq!(diagnostic.causes().len(), 1);
        assert!(!diagnostic.detail().is_empty());
    }

    #[test]
    fn test_yaml_error_detail_shows_whitespace() {
        let yaml = "title: ok\nbad: [unclosed\n";
        let err = serde_yaml::from_str::<Value>(yaml).unwrap_err();
        let detail = yaml_error_detail(yaml, &err);

        assert!(detail.contains('⭾') || detail.contains('·'));
        assert!(detail.contains("Lines with trailing whitespace"));
    }

    #[test]
    fn test_parse_non_mapping_front_matter() {
        let parser = FrontMatterParser::new();
        let fm = parser.parse("---\n- just\n- a list\n---\nBODY").unwrap();

        assert!(fm.metadata.is_empty());
        assert_eq!(fm.body, "BODY");
        assert!(fm.diagnostic.is_some());
    }

    #[test]
    fn test_custom_delimiter() {
        let parser = FrontMatterParser::new().with_delimiter(r"^\+{3,}$").unwrap();
        let fm = parser.parse("+++\nk: v\n+++\nBODY").unwrap();

        assert_eq!(fm.metadata.get("k"), Some(&Value::from("v")));
        assert_eq!(fm.body, "BODY");
        assert!(fm.diagnostic.is_none());
    }

    #[test]
    fn test_diagnostic_summary_joins_messages() {
        let mut diagnostic = ParseDiagnostic::new();
        diagnostic.push("first");
        diagnostic.push("second");

        assert_eq!(diagnostic.summary(), "first | second");
        assert_eq!(diagnostic.messages().len(), 2);
    }
}
