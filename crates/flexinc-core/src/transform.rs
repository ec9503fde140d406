//! Content transforms applied between loading and presentation.
//!
//! [`apply`] runs the enabled stages in a fixed order:
//!
//! 1. line range extraction (`from`/`to`/`until`)
//! 2. HTML escaping (on unless `do_not_escape`)
//! 3. whitespace strip
//! 4. pattern highlight, matched against the escaped text
//! 5. line numbering

use regex::Regex;

use crate::directive::{LineRange, RenderOptions};

const HIGHLIGHT_REPLACEMENT: &str = "<span class='bg_yellow'>${0}</span>";

/// Run every requested stage over `content`.
#[must_use]
pub fn apply(content: String, options: &RenderOptions) -> String {
    let mut content = if options.range.is_active() {
        extract_range(&content, &options.range)
    } else {
        content
    };

    if !options.do_not_escape {
        content = escape_html(&content);
    }

    if options.strip {
        content = content.trim().to_owned();
    }

    if let Some(pattern) = &options.highlight {
        content = highlight(&content, pattern);
    }

    if options.number {
        content = number_lines(&content);
    }

    content
}

/// Escape `&`, `{`, `}` and `<`.
///
/// Braces are escaped so included text is never re-interpreted as template
/// syntax by the host.
///
/// ```
/// use flexinc_core::escape_html;
///
/// assert_eq!(escape_html("a < b && {x}"), "a &lt; b &amp;&amp; &#123;x&#125;");
/// ```
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '{' => result.push_str("&#123;"),
            '}' => result.push_str("&#125;"),
            '<' => result.push_str("&lt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Narrow `content` to the lines selected by `range`.
///
/// The range starts at the first line matching `from` (or the first line).
/// It ends at the first later line matching `to` (kept) or `until` (dropped),
/// or at the last line. `to` wins when both are given. A marker that matches
/// nothing leaves that side untouched.
#[must_use]
pub fn extract_range(content: &str, range: &LineRange) -> String {
    let lines: Vec<&str> = content.split('\n').collect();

    let from_match = range
        .from
        .as_ref()
        .and_then(|re| lines.iter().position(|line| re.is_match(line)));
    let start = from_match.unwrap_or(0);
    let search_from = if from_match.is_some() { start + 1 } else { start };

    let find_after = |re: &Regex| {
        lines[search_from.min(lines.len())..]
            .iter()
            .position(|line| re.is_match(line))
            .map(|offset| search_from + offset)
    };

    let end = if let Some(to) = &range.to {
        find_after(to).map_or(lines.len(), |idx| idx + 1)
    } else if let Some(until) = &range.until {
        find_after(until).unwrap_or(lines.len())
    } else {
        lines.len()
    };

    lines[start..end.max(start)].join("\n")
}

/// Wrap every match of `pattern` in a highlight span.
#[must_use]
pub fn highlight(content: &str, pattern: &Regex) -> String {
    pattern.replace_all(content, HIGHLIGHT_REPLACEMENT).into_owned()
}

/// Prefix each line with a right-justified line number.
///
/// Trailing empty lines are not numbered. The result always ends with a
/// newline.
#[must_use]
pub fn number_lines(content: &str) -> String {
    let mut lines: Vec<&str> = content.split('\n').collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    let width = lines.len().to_string().len();
    let mut result = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            format!(
                "<span class='unselectable numbered_line'> {:>width$}: </span>{line}",
                i + 1
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    result.push('\n');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn range(from: Option<&str>, to: Option<&str>, until: Option<&str>) -> LineRange {
        let compile = |p: Option<&str>| p.map(|p| Regex::new(p).unwrap());
        LineRange {
            from: compile(from),
            to: compile(to),
            until: compile(until),
        }
    }

    fn unescape(s: &str) -> String {
        s.replace("&lt;", "<")
            .replace("&#125;", "}")
            .replace("&#123;", "{")
            .replace("&amp;", "&")
    }

    #[test]
    fn test_no_options_only_escapes() {
        let output = apply("<b>{{ x }}</b> & more\n".to_owned(), &RenderOptions::default());
        assert_eq!(output, "&lt;b>&#123;&#123; x &#125;&#125;&lt;/b> &amp; more\n");
    }

    #[test]
    fn test_do_not_escape() {
        let options = RenderOptions {
            do_not_escape: true,
            ..Default::default()
        };
        assert_eq!(apply("<b>&</b>".to_owned(), &options), "<b>&</b>");
    }

    #[test]
    fn test_escape_round_trip() {
        for input in ["&", "{}", "<<&>>", "&amp;", "{&lt;}", "plain"] {
            assert_eq!(unescape(&escape_html(input)), input);
        }
    }

    #[test]
    fn test_ampersand_escaped_once() {
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
        assert_eq!(escape_html("{"), "&#123;");
    }

    #[test]
    fn test_range_from_to() {
        let content = "A\nFROM\nB\nC\nTO\nD";
        let output = extract_range(content, &range(Some("FROM"), Some("TO"), None));
        assert_eq!(output, "FROM\nB\nC\nTO");
    }

    #[test]
    fn test_range_from_until() {
        let content = "A\nFROM\nB\nC\nTO\nD";
        let output = extract_range(content, &range(Some("FROM"), None, Some("TO")));
        assert_eq!(output, "FROM\nB\nC");
    }

    #[test]
    fn test_range_to_wins_over_until() {
        let content = "A\nFROM\nB\nC\nTO\nD";
        let output = extract_range(content, &range(Some("FROM"), Some("TO"), Some("B")));
        assert_eq!(output, "FROM\nB\nC\nTO");
    }

    #[test]
    fn test_range_unmatched_markers_do_not_truncate() {
        let content = "A\nB\nC";
        assert_eq!(extract_range(content, &range(Some("X"), None, None)), content);
        assert_eq!(extract_range(content, &range(None, Some("X"), None)), content);
        assert_eq!(extract_range(content, &range(Some("B"), Some("X"), None)), "B\nC");
    }

    #[test]
    fn test_range_end_marker_searched_after_start() {
        let content = "fn a() {\n}\nfn b() {\n  x\n}\n";
        let output = extract_range(content, &range(Some("^fn b"), Some("^[}]"), None));
        assert_eq!(output, "fn b() {\n  x\n}");
    }

    #[test]
    fn test_range_without_from_starts_at_top() {
        let content = "A\nB\nC";
        assert_eq!(extract_range(content, &range(None, None, Some("C"))), "A\nB");
    }

    #[test]
    fn test_strip_after_escape() {
        let options = RenderOptions {
            strip: true,
            ..Default::default()
        };
        assert_eq!(apply("\n  <x>  \n\n".to_owned(), &options), "&lt;x>");
    }

    #[test]
    fn test_highlight_matches_escaped_text() {
        let options = RenderOptions {
            highlight: Some(Regex::new("&lt;b").unwrap()),
            ..Default::default()
        };
        assert_eq!(
            apply("<b>".to_owned(), &options),
            "<span class='bg_yellow'>&lt;b</span>>"
        );
    }

    #[test]
    fn test_highlight_all_matches() {
        let re = Regex::new("o+").unwrap();
        assert_eq!(
            highlight("foo boo", &re),
            "f<span class='bg_yellow'>oo</span> b<span class='bg_yellow'>oo</span>"
        );
    }

    #[test]
    fn test_number_lines() {
        assert_eq!(
            number_lines("a\nb\nc"),
            "<span class='unselectable numbered_line'> 1: </span>a\n\
             <span class='unselectable numbered_line'> 2: </span>b\n\
             <span class='unselectable numbered_line'> 3: </span>c\n"
        );
    }

    #[test]
    fn test_number_width_follows_line_count() {
        let content = (1..=12).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let output = number_lines(&content);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 12);
        assert!(lines[0].starts_with("<span class='unselectable numbered_line'>  1: </span>"));
        assert!(lines[11].starts_with("<span class='unselectable numbered_line'> 12: </span>"));

        let stripped: Vec<&str> = lines
            .iter()
            .map(|line| line.split_once("</span>").unwrap().1)
            .collect();
        assert_eq!(stripped.join("\n"), content);
    }

    #[test]
    fn test_number_lines_drops_trailing_blank_lines() {
        assert_eq!(
            number_lines("x\n\n"),
            "<span class='unselectable numbered_line'> 1: </span>x\n"
        );
    }

    #[test]
    fn test_stage_order() {
        let options = RenderOptions {
            strip: true,
            number: true,
            highlight: Some(Regex::new("TODO").unwrap()),
            range: range(Some("start"), Some("end"), None),
            ..Default::default()
        };
        let content = "skip\nstart\n  TODO <a>\nend\nskip".to_owned();
        assert_eq!(
            apply(content, &options),
            "<span class='unselectable numbered_line'> 1: </span>start\n\
             <span class='unselectable numbered_line'> 2: </span>  <span class='bg_yellow'>TODO</span> &lt;a>\n\
             <span class='unselectable numbered_line'> 3: </span>end\n"
        );
    }
}
