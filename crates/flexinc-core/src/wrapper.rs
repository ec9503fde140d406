//! Pre-mode presentation: a label line followed by a `<pre>` block.

use std::fmt::Write;

use crate::directive::RenderOptions;

/// Wrap transformed content in a labeled block with a fresh identifier.
///
/// `basename` is the default label and the download name: a file's basename
/// or a command line.
#[must_use]
pub fn wrap(basename: &str, content: &str, options: &RenderOptions) -> String {
    wrap_with_id(basename, content, options, &new_block_id())
}

/// [`wrap`] with a caller-chosen block identifier.
#[must_use]
pub fn wrap_with_id(basename: &str, content: &str, options: &RenderOptions, id: &str) -> String {
    let label = options.label.as_deref().unwrap_or(basename);
    let label_or_anchor = if options.download {
        format!(
            "<a href='data:text/plain;charset=UTF-8,{basename}' download='{basename}' \
             title='Click on the file name to download the file'>{label}</a>"
        )
    } else {
        label.to_owned()
    };

    let (label_class, pre_class) = if options.dark {
        ("codeLabel darkLabel", "pre_tag maxOneScreenHigh copyContainer dark")
    } else {
        ("codeLabel", "pre_tag maxOneScreenHigh copyContainer")
    };

    let mut html = String::with_capacity(content.len() + 256);
    let _ = writeln!(html, r#"<div class="{label_class}">{label_or_anchor}</div>"#);
    let _ = write!(
        html,
        r#"<pre data-lt-active="false" class="{pre_class}" id="{id}">"#
    );
    if options.copy_button {
        let _ = write!(
            html,
            "<button class='copyBtn' data-clipboard-target='#{id}' title='Copy to clipboard'>\
             <img src='/assets/images/clippy.svg' alt='Copy to clipboard' style='width: 13px'></button>"
        );
    }
    html.push_str(content);
    html.push_str("</pre>");
    html
}

/// `id` followed by 12 lowercase hex digits.
#[must_use]
pub fn new_block_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("id{}", &uuid[..12])
}
