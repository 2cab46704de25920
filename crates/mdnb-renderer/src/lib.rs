//! Markdown-to-HTML rendering with a pluggable backend.
//!
//! The compilation pipeline only depends on the [`MarkdownBackend`] trait,
//! so the Markdown grammar itself stays swappable. [`CmarkBackend`] is the
//! default implementation, built on pulldown-cmark with GitHub Flavored
//! Markdown extensions enabled.

use pulldown_cmark::{Options, Parser, html};

/// Converts Markdown body text to HTML.
///
/// Implementations must be safe to share across threads; the compiler
/// invokes the backend concurrently for different documents.
pub trait MarkdownBackend: Send + Sync {
    /// Render `markdown` to an HTML fragment.
    fn render(&self, markdown: &str) -> String;
}

/// pulldown-cmark backend with GFM enabled by default.
///
/// # Example
///
/// ```
/// use mdnb_renderer::{CmarkBackend, MarkdownBackend};
///
/// let backend = CmarkBackend::new();
/// let html = backend.render("hello *world*");
/// assert_eq!(html, "<p>hello <em>world</em></p>\n");
/// ```
#[derive(Debug, Default)]
pub struct CmarkBackend {
    gfm: bool,
}

impl CmarkBackend {
    /// Create a backend with GFM enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// When enabled, the parser supports tables, strikethrough
    /// (`~~text~~`), and task lists (`- [ ] item`).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Parser options based on the GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }
}

impl MarkdownBackend for CmarkBackend {
    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.parser_options());
        let mut output = String::with_capacity(markdown.len() * 2);
        html::push_html(&mut output, parser);
        output
    }
}
