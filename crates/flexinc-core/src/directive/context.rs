//! Per-invocation context supplied by the host template engine.
//!
//! Provides the originating document location for error messages and the
//! variable scope for `{{name}}` references.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Variable lookup provided by the host engine.
pub trait VariableScope {
    /// Value of `name` (e.g. `page.snippet`), or `None` when undefined.
    fn lookup(&self, name: &str) -> Option<String>;
}

impl VariableScope for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Context for a single include invocation.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use flexinc_core::directive::IncludeContext;
///
/// let ctx = IncludeContext::new(Path::new("_posts/2024-01-01-hello.md"), 12);
/// assert_eq!(
///     ctx.location().to_string(),
///     "line 12 (after front matter) of _posts/2024-01-01-hello.md"
/// );
/// ```
#[derive(Clone, Copy, Default)]
pub struct IncludeContext<'a> {
    /// Document containing the directive (if known).
    pub document: Option<&'a Path>,
    /// Line of the directive in the document, counted after front matter (1-indexed).
    pub line: usize,
    /// Variables visible at the directive.
    pub scope: Option<&'a dyn VariableScope>,
}

impl<'a> IncludeContext<'a> {
    /// Context for a directive at `line` of `document`.
    pub fn new(document: &'a Path, line: usize) -> Self {
        Self {
            document: Some(document),
            line,
            scope: None,
        }
    }

    /// Attach a variable scope.
    #[must_use]
    pub fn with_scope(mut self, scope: &'a dyn VariableScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Owned source location for error reporting.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            document: self.document.map(Path::to_path_buf),
            line: self.line,
        }
    }
}

/// Where a directive appears.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceLocation {
    /// Document path, if known.
    pub document: Option<PathBuf>,
    /// Line number after front matter.
    pub line: usize,
}

impl SourceLocation {
    /// Document path for messages; `<unknown>` when not supplied.
    pub fn document_display(&self) -> String {
        self.document
            .as_deref()
            .map_or_else(|| "<unknown>".to_owned(), |p| p.display().to_string())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {} (after front matter) of {}",
            self.line,
            self.document_display()
        )
    }
}
