//! The include pipeline: parse, resolve, load, transform, wrap.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use flexinc_config::Config;

use crate::directive::{Directive, IncludeContext, RenderOptions};
use crate::error::{ErrorPolicy, Failure, IncludeError};
use crate::loader;
use crate::policy::AccessPolicy;
use crate::resolver::ReferenceResolver;
use crate::transform;
use crate::wrapper;

/// Renders include directives.
///
/// Holds only read-only state, so one instance can serve any number of
/// documents, including from several threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use flexinc_config::ErrorConfig;
/// use flexinc_core::{AccessPolicy, ErrorPolicy, FlexibleInclude, directive::IncludeContext};
///
/// let include = FlexibleInclude::new(
///     Arc::new(AccessPolicy::allow_all()),
///     ErrorPolicy::new(ErrorConfig::default()),
///     "/nonexistent-site",
/// );
/// let html = include.render("missing.txt", &IncludeContext::default()).unwrap();
/// assert!(html.starts_with("<div class='flexible_error'>"));
/// ```
pub struct FlexibleInclude {
    policy: Arc<AccessPolicy>,
    errors: ErrorPolicy,
    source_dir: PathBuf,
    home: Option<PathBuf>,
}

impl FlexibleInclude {
    pub fn new(policy: Arc<AccessPolicy>, errors: ErrorPolicy, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            policy,
            errors,
            source_dir: source_dir.into(),
            home: dirs::home_dir(),
        }
    }

    /// Build from loaded configuration and an initialized policy.
    pub fn from_config(config: &Config, policy: Arc<AccessPolicy>) -> Self {
        Self::new(
            policy,
            ErrorPolicy::new(config.errors),
            config.project_resolved.source_dir.clone(),
        )
    }

    /// Resolve `~` against `home` instead of the user's home directory.
    #[must_use]
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Project root for relative references.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Render one directive.
    ///
    /// Failures are routed through [`ErrorPolicy`]: non-fatal ones come back
    /// as an inline error marker in `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError`] when the failure's governing `die_on_*` flag is set.
    pub fn render(&self, markup: &str, ctx: &IncludeContext<'_>) -> Result<String, IncludeError> {
        match self.try_render(markup, ctx) {
            Ok(output) => Ok(output),
            Err(failure) => self.errors.handle(failure, &ctx.location()),
        }
    }

    fn try_render(&self, markup: &str, ctx: &IncludeContext<'_>) -> Result<String, Failure> {
        let directive = Directive::parse(markup, ctx.scope)?;
        let options = RenderOptions::from_directive(&directive)?;
        let filename = directive.filename().ok_or_else(|| Failure::InvalidOption {
            message: "no file name or command given".to_owned(),
        })?;

        let resolver =
            ReferenceResolver::new(&self.policy, &self.source_dir).with_home(self.home.clone());
        let (kind, reference) = resolver.resolve(filename)?;
        tracing::debug!(?kind, ?reference, "Resolved include");

        let content = loader::load(&reference)?;
        let content = transform::apply(content, &options);

        if options.pre {
            Ok(wrapper::wrap(&reference.label(), &content, &options))
        } else {
            Ok(content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use flexinc_config::ErrorConfig;
    use pretty_assertions::assert_eq;
    use regex::Regex;

    use crate::directive::SourceLocation;
    use crate::error::FailureKind;
    use crate::policy::PolicySettings;

    fn include(dir: &Path, errors: ErrorConfig) -> FlexibleInclude {
        FlexibleInclude::new(
            Arc::new(AccessPolicy::allow_all()),
            ErrorPolicy::new(errors),
            dir,
        )
    }

    fn normalize_id(html: &str) -> String {
        Regex::new("id[0-9a-f]{12}")
            .unwrap()
            .replace_all(html, "idXXXXXXXXXXXX")
            .into_owned()
    }

    #[test]
    fn test_plain_include_escapes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.html"), "<b>{{ x }}</b>\n").unwrap();

        let output = include(dir.path(), ErrorConfig::default())
            .render("a.html", &IncludeContext::default())
            .unwrap();
        assert_eq!(output, "&lt;b>&#123;&#123; x &#125;&#125;&lt;/b>\n");
    }

    #[test]
    fn test_numbered_file_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), "a\nb\nc").unwrap();

        let output = include(dir.path(), ErrorConfig::default())
            .render("file.txt number", &IncludeContext::default())
            .unwrap();
        assert_eq!(
            normalize_id(&output),
            "<div class=\"codeLabel\">file.txt</div>\n\
             <pre data-lt-active=\"false\" class=\"pre_tag maxOneScreenHigh copyContainer\" id=\"idXXXXXXXXXXXX\">\
             <span class='unselectable numbered_line'> 1: </span>a\n\
             <span class='unselectable numbered_line'> 2: </span>b\n\
             <span class='unselectable numbered_line'> 3: </span>c\n</pre>"
        );
    }

    #[test]
    fn test_file_option_and_label() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "body").unwrap();

        let output = include(dir.path(), ErrorConfig::default())
            .render("file=b.txt label='Sample file'", &IncludeContext::default())
            .unwrap();
        assert!(output.starts_with("<div class=\"codeLabel\">Sample file</div>"));
        assert!(output.ends_with(">body</pre>"));
    }

    #[test]
    fn test_missing_file_inline() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Path::new("index.md");

        let output = include(dir.path(), ErrorConfig::default())
            .render("missing.txt", &IncludeContext::new(doc, 4))
            .unwrap();
        assert!(output.starts_with("<div class='flexible_error'>"));
        assert!(output.contains("missing.txt does not exist"));
        assert!(output.contains("line 4 (after front matter) of index.md"));
    }

    #[test]
    fn test_missing_file_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Path::new("index.md");
        let errors = ErrorConfig {
            die_on_file_error: true,
            ..Default::default()
        };

        let err = include(dir.path(), errors)
            .render("missing.txt", &IncludeContext::new(doc, 4))
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);
        assert!(err.to_string().contains("missing.txt"));
        assert!(err.to_string().contains("index.md"));
        assert_eq!(
            err.location(),
            &SourceLocation {
                document: Some(PathBuf::from("index.md")),
                line: 4,
            }
        );
        assert!(matches!(
            err.failure(),
            Failure::NotFound { path, .. } if path == &dir.path().join("missing.txt")
        ));
    }

    #[test]
    fn test_command_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = include(dir.path(), ErrorConfig::default())
            .render(r#""!printf '%s' '<hi>'""#, &IncludeContext::default())
            .unwrap();
        assert_eq!(output, "&lt;hi>");
    }

    #[test]
    fn test_command_keeps_trailing_quoted_argument() {
        let dir = tempfile::tempdir().unwrap();
        let output = include(dir.path(), ErrorConfig::default())
            .render(r#"'!echo "a b"'"#, &IncludeContext::default())
            .unwrap();
        assert_eq!(output, "a b");
    }

    #[test]
    fn test_command_label_is_command_line() {
        let dir = tempfile::tempdir().unwrap();
        let output = include(dir.path(), ErrorConfig::default())
            .render("'!echo hi' pre", &IncludeContext::default())
            .unwrap();
        assert!(output.starts_with("<div class=\"codeLabel\">echo hi</div>"));
    }

    #[test]
    fn test_execution_disabled_never_runs_shell() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let policy = AccessPolicy::compile(&PolicySettings {
            include_paths: None,
            execution_disabled: true,
        });
        let include = FlexibleInclude::new(Arc::new(policy), ErrorPolicy::default(), dir.path());

        let markup = format!("'!touch {}'", marker.display());
        let output = include.render(&markup, &IncludeContext::default()).unwrap();
        assert_eq!(
            output,
            "<p class='flexible_error'>Arbitrary command execution denied by DISABLE_FLEXIBLE_INCLUDE value.</p>"
        );
        assert!(!marker.exists());
    }

    #[test]
    fn test_absolute_path_denied() {
        let dir = tempfile::tempdir().unwrap();
        let policy = AccessPolicy::compile(&PolicySettings {
            include_paths: Some("/nowhere/.*".to_owned()),
            execution_disabled: false,
        });
        let errors = ErrorPolicy::new(ErrorConfig {
            die_on_path_denied: true,
            ..Default::default()
        });
        let include = FlexibleInclude::new(Arc::new(policy), errors, dir.path());

        let err = include
            .render("/etc/hostname", &IncludeContext::default())
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::PathDenied);
    }

    #[test]
    fn test_home_relative_include() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join("notes.txt"), "from home").unwrap();
        let site = tempfile::tempdir().unwrap();

        let output = include(site.path(), ErrorConfig::default())
            .with_home(Some(home.path().to_path_buf()))
            .render("~/notes.txt", &IncludeContext::default())
            .unwrap();
        assert_eq!(output, "from home");
    }

    #[test]
    fn test_variable_reference() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("c.txt"), "see").unwrap();
        let scope = HashMap::from([("page_file".to_owned(), "c.txt".to_owned())]);

        let output = include(dir.path(), ErrorConfig::default())
            .render("{{page_file}}", &IncludeContext::default().with_scope(&scope))
            .unwrap();
        assert_eq!(output, "see");
    }

    #[test]
    fn test_missing_filename_is_invalid_option() {
        let dir = tempfile::tempdir().unwrap();
        let errors = ErrorConfig {
            die_on_other_error: true,
            ..Default::default()
        };
        let err = include(dir.path(), errors)
            .render("number", &IncludeContext::default())
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidOption);
    }

    #[test]
    fn test_empty_command() {
        let dir = tempfile::tempdir().unwrap();
        let output = include(dir.path(), ErrorConfig::default())
            .render("'! '", &IncludeContext::default())
            .unwrap();
        assert!(output.starts_with("<span class='flexible_error'>Empty command string"));
    }

    #[test]
    fn test_from_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("d.txt"), "cfg").unwrap();
        let config = Config::default_with_base(dir.path());

        let include = FlexibleInclude::from_config(&config, Arc::new(AccessPolicy::allow_all()));
        assert_eq!(include.source_dir(), dir.path());
        assert_eq!(include.render("d.txt", &IncludeContext::default()).unwrap(), "cfg");
    }
}
