//! Typed render options, validated once per invocation.

use regex::Regex;

use super::Directive;
use crate::error::Failure;

/// Line range markers for `from`/`to`/`until`.
#[derive(Clone, Debug, Default)]
pub struct LineRange {
    /// First line matching this pattern starts the range (inclusive).
    pub from: Option<Regex>,
    /// First later line matching this pattern ends the range (inclusive).
    pub to: Option<Regex>,
    /// First later line matching this pattern ends the range (exclusive).
    /// Ignored when `to` is set.
    pub until: Option<Regex>,
}

impl LineRange {
    /// Whether any marker is set.
    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some() || self.until.is_some()
    }
}

/// Options for one invocation.
#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
    /// Skip HTML escaping.
    pub do_not_escape: bool,
    /// Render the label as a download link.
    pub download: bool,
    /// Dark styling on the label and block.
    pub dark: bool,
    /// Wrap every match in a highlight span.
    pub highlight: Option<Regex>,
    /// Explicit label text.
    pub label: Option<String>,
    /// Add a copy-to-clipboard button.
    pub copy_button: bool,
    /// Prefix lines with numbers.
    pub number: bool,
    /// Trim surrounding whitespace.
    pub strip: bool,
    /// Line range extraction markers.
    pub range: LineRange,
    /// Wrap in a labeled block.
    pub pre: bool,
}

impl RenderOptions {
    /// Build options from a parsed directive.
    ///
    /// `pre` is on when requested explicitly or implied by `copyButton`,
    /// `dark`, `download`, `label` or `number`.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::InvalidOption`] when a value-taking option is given
    /// bare or a pattern is not a valid regular expression.
    pub fn from_directive(directive: &Directive) -> Result<Self, Failure> {
        text_option(directive, "file")?;
        let label = text_option(directive, "label")?.map(str::to_owned);
        let mut options = Self {
            do_not_escape: directive.flag("do_not_escape"),
            download: directive.flag("download"),
            dark: directive.flag("dark"),
            highlight: pattern_option(directive, "highlight")?,
            copy_button: directive.flag("copyButton"),
            number: directive.flag("number"),
            strip: directive.flag("strip"),
            range: LineRange {
                from: pattern_option(directive, "from")?,
                to: pattern_option(directive, "to")?,
                until: pattern_option(directive, "until")?,
            },
            pre: directive.flag("pre"),
            label,
        };
        options.pre = options.pre
            || options.copy_button
            || options.dark
            || options.download
            || options.label.is_some()
            || options.number;
        Ok(options)
    }
}

fn text_option<'a>(directive: &'a Directive, key: &str) -> Result<Option<&'a str>, Failure> {
    match directive.get(key) {
        None => Ok(None),
        Some(_) => directive
            .text(key)
            .map(Some)
            .ok_or_else(|| Failure::InvalidOption {
                message: format!("the '{key}' option requires a value"),
            }),
    }
}

fn pattern_option(directive: &Directive, key: &str) -> Result<Option<Regex>, Failure> {
    let Some(pattern) = text_option(directive, key)? else {
        return Ok(None);
    };
    Regex::new(pattern)
        .map(Some)
        .map_err(|e| Failure::InvalidOption {
            message: format!("the '{key}' pattern is invalid: {e}"),
        })
}
