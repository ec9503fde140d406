//! Directive markup parsing.
//!
//! Splits `<filename-or-command> [key=value ...]` into the filename token and
//! named options, using shell-word rules for quoting.

use std::collections::HashMap;

use super::context::VariableScope;
use crate::error::Failure;

/// Recognized option names. A bare token naming one of these is an option,
/// never the filename.
const OPTION_NAMES: &[&str] = &[
    "copyButton",
    "dark",
    "do_not_escape",
    "download",
    "file",
    "from",
    "highlight",
    "label",
    "number",
    "pre",
    "strip",
    "to",
    "until",
];

/// Value of a named option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    /// Key given without `=value`.
    Flag,
    /// Key given as `key=value`.
    Text(String),
}

/// Parsed directive markup.
///
/// # Example
///
/// ```
/// use flexinc_core::directive::{Directive, OptionValue};
///
/// let directive = Directive::parse(r#"notes.txt number highlight="TODO|FIXME""#, None).unwrap();
/// assert_eq!(directive.filename(), Some("notes.txt"));
/// assert_eq!(directive.get("number"), Some(&OptionValue::Flag));
/// assert_eq!(directive.text("highlight"), Some("TODO|FIXME"));
/// ```
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Directive {
    /// Bare tokens that are not recognized option names, in order.
    pub positional: Vec<String>,
    /// Named options.
    pub options: HashMap<String, OptionValue>,
}

impl Directive {
    /// Parse directive markup.
    ///
    /// `{{name}}` tokens and values are replaced through `scope` when one is
    /// given; unknown names become the empty string.
    pub fn parse(markup: &str, scope: Option<&dyn VariableScope>) -> Result<Self, Failure> {
        let tokens = shlex::split(markup).ok_or_else(|| Failure::InvalidOption {
            message: format!("unbalanced quotes in `{markup}`"),
        })?;

        let mut directive = Self::default();
        for token in tokens {
            if let Some((key, value)) = split_key_value(&token) {
                let value = OptionValue::Text(dereference(value, scope));
                directive.options.insert(key.to_owned(), value);
            } else if OPTION_NAMES.contains(&token.as_str()) {
                directive.options.insert(token, OptionValue::Flag);
            } else {
                directive.positional.push(dereference(&token, scope));
            }
        }

        tracing::debug!(?directive, "Parsed directive");
        Ok(directive)
    }

    /// Filename or command token: the `file` option, else the first positional token.
    pub fn filename(&self) -> Option<&str> {
        match self.options.get("file") {
            Some(OptionValue::Text(file)) => Some(file.as_str()),
            _ => self.positional.first().map(String::as_str),
        }
    }

    /// Get an option by key.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    /// Get the text value of an option, if it was given as `key=value`.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.options.get(key) {
            Some(OptionValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// Whether a boolean option is on.
    ///
    /// A bare key is on; `key=false`, `key=no` and `key=0` are off; any other
    /// value is on.
    pub fn flag(&self, key: &str) -> bool {
        match self.options.get(key) {
            None => false,
            Some(OptionValue::Flag) => true,
            Some(OptionValue::Text(value)) => {
                !matches!(value.to_ascii_lowercase().as_str(), "false" | "no" | "0")
            }
        }
    }
}

/// Split `key=value`. Keys must start with a letter or underscore, so a
/// command such as `!grep a=b` is never mistaken for an option.
fn split_key_value(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once('=')?;
    let mut chars = key.chars();
    let first = chars.next()?;
    let valid = (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some((key, value))
}

/// Replace a `{{name}}` reference with its value from the scope.
fn dereference(token: &str, scope: Option<&dyn VariableScope>) -> String {
    let Some(scope) = scope else {
        return token.to_owned();
    };
    match token
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
    {
        Some(name) => scope.lookup(name.trim()).unwrap_or_default(),
        None => token.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filename_only() {
        let directive = Directive::parse("file.txt", None).unwrap();
        assert_eq!(directive.filename(), Some("file.txt"));
        assert!(directive.options.is_empty());
    }

    #[test]
    fn test_flags_and_values() {
        let directive = Directive::parse("file.txt number dark label='My File'", None).unwrap();
        assert_eq!(directive.filename(), Some("file.txt"));
        assert!(directive.flag("number"));
        assert!(directive.flag("dark"));
        assert!(!directive.flag("strip"));
        assert_eq!(directive.text("label"), Some("My File"));
    }

    #[test]
    fn test_file_option_wins() {
        let directive = Directive::parse("ignored file=real.txt", None).unwrap();
        assert_eq!(directive.filename(), Some("real.txt"));
    }

    #[test]
    fn test_flag_with_false_value() {
        let directive = Directive::parse("a.txt number=false strip=true", None).unwrap();
        assert!(!directive.flag("number"));
        assert!(directive.flag("strip"));
    }

    #[test]
    fn test_quoted_command_keeps_spaces() {
        let directive = Directive::parse(r#""!ls -l /tmp" pre"#, None).unwrap();
        assert_eq!(directive.filename(), Some("!ls -l /tmp"));
        assert!(directive.flag("pre"));
    }

    #[test]
    fn test_command_with_equals_is_positional() {
        let directive = Directive::parse("'!env FOO=bar'", None).unwrap();
        assert_eq!(directive.filename(), Some("!env FOO=bar"));
    }

    #[test]
    fn test_unknown_bare_word_is_positional() {
        let directive = Directive::parse("a.txt extra words", None).unwrap();
        assert_eq!(directive.positional, vec!["a.txt", "extra", "words"]);
    }

    #[test]
    fn test_unbalanced_quotes() {
        let err = Directive::parse("'a.txt", None).unwrap_err();
        assert!(matches!(err, Failure::InvalidOption { .. }));
    }

    #[test]
    fn test_variable_reference() {
        let mut scope = HashMap::new();
        scope.insert("page.snippet".to_owned(), "snippets/a.rs".to_owned());
        let directive = Directive::parse("{{page.snippet}} label={{missing}}", Some(&scope as &dyn VariableScope)).unwrap();
        assert_eq!(directive.filename(), Some("snippets/a.rs"));
        assert_eq!(directive.text("label"), Some(""));
    }

    #[test]
    fn test_variable_reference_without_scope_is_literal() {
        let directive = Directive::parse("{{page.snippet}}", None).unwrap();
        assert_eq!(directive.filename(), Some("{{page.snippet}}"));
    }

    #[test]
    fn test_empty_markup() {
        let directive = Directive::parse("", None).unwrap();
        assert_eq!(directive.filename(), None);
    }
}
