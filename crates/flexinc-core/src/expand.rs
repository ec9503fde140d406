//! String primitives shared by the resolver and the access policy.
//!
//! - [`expand_env`]: `$NAME`, `${NAME}` and `%NAME%` references
//! - [`expand_home`]: a leading `~` to the user's home directory
//! - [`remove_quotes`]: one pair of surrounding quotes

use std::sync::LazyLock;

use regex::Regex;

static PERCENT_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%([A-Za-z_][A-Za-z0-9_]*)%").unwrap());

/// Expand environment variable references.
///
/// Undefined variables expand to the empty string.
///
/// # Example
///
/// ```
/// use flexinc_core::expand_env;
///
/// assert_eq!(expand_env("plain/path.txt"), "plain/path.txt");
/// ```
pub fn expand_env(value: &str) -> String {
    if !value.contains('$') && !value.contains('%') {
        return value.to_owned();
    }

    let expanded = shellexpand::env_with_context_no_errors(value, |var| {
        Some(std::env::var(var).unwrap_or_default())
    });

    PERCENT_VAR_RE
        .replace_all(&expanded, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

/// Replace a leading `~` (alone or followed by `/`) with the home directory.
///
/// `~user` forms are left unchanged, as is everything when no home
/// directory can be determined.
pub fn expand_home(value: &str) -> String {
    shellexpand::tilde_with_context(value, || {
        dirs::home_dir().map(|home| home.to_string_lossy().into_owned())
    })
    .into_owned()
}

/// Environment and home expansion, in that order.
pub(crate) fn normalize_path(value: &str) -> String {
    expand_home(&expand_env(value))
}

/// A variable referenced by a value but not set in the environment.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct UnsetVar(pub(crate) String);

/// Like [`expand_env`], but fails on the first undefined variable instead
/// of substituting the empty string.
pub(crate) fn try_expand_env(value: &str) -> Result<String, UnsetVar> {
    let expanded = shellexpand::env_with_context(value, |var| {
        std::env::var(var)
            .map(Some)
            .map_err(|_| UnsetVar(var.to_owned()))
    })
    .map_err(|e| e.cause)?;

    if let Some(caps) = PERCENT_VAR_RE
        .captures_iter(&expanded)
        .find(|caps| std::env::var(&caps[1]).is_err())
    {
        return Err(UnsetVar(caps[1].to_owned()));
    }

    Ok(PERCENT_VAR_RE
        .replace_all(&expanded, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned())
}

/// [`normalize_path`] that fails on undefined variables.
pub(crate) fn try_normalize_path(value: &str) -> Result<String, UnsetVar> {
    try_expand_env(value).map(|expanded| expand_home(&expanded))
}

/// Strip one pair of matching surrounding quotes, then surrounding whitespace.
///
/// Unpaired quotes are kept, so a command such as `!echo "a b"` reaches the
/// shell intact.
///
/// # Example
///
/// ```
/// use flexinc_core::remove_quotes;
///
/// assert_eq!(remove_quotes(r#" "!ls -l" "#), "!ls -l");
/// assert_eq!(remove_quotes("'file.txt'"), "file.txt");
/// assert_eq!(remove_quotes(r#"!echo "a b""#), r#"!echo "a b""#);
/// ```
pub fn remove_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    ['\'', '"']
        .into_iter()
        .find_map(|quote| trimmed.strip_prefix(quote)?.strip_suffix(quote))
        .map_or(trimmed, str::trim)
}
