//! Reference classification and resolution.
//!
//! | Leading character | Kind | Resolution |
//! |---|---|---|
//! | `/` | [`ReferenceKind::AbsolutePath`] | path unchanged, allow-list checked |
//! | `~` | [`ReferenceKind::HomeRelativePath`] | joined to the home directory, allow-list checked |
//! | `!` | [`ReferenceKind::Command`] | command line, kill switch checked |
//! | anything else | [`ReferenceKind::ProjectRelativePath`] | joined to the project root |
//!
//! Classification looks at the environment-expanded token, but a command line
//! is taken from the raw token. `!echo $HOME` therefore reaches the shell with
//! `$HOME` intact and the shell expands it, not the resolver.

use std::path::{Path, PathBuf};

use crate::error::{Failure, Missing};
use crate::expand::{expand_env, remove_quotes};
use crate::policy::AccessPolicy;

/// Kind of reference a directive names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceKind {
    AbsolutePath,
    HomeRelativePath,
    Command,
    ProjectRelativePath,
}

impl ReferenceKind {
    /// Classify by leading character.
    ///
    /// ```
    /// use flexinc_core::ReferenceKind;
    ///
    /// assert_eq!(ReferenceKind::classify("/etc/hosts"), ReferenceKind::AbsolutePath);
    /// assert_eq!(ReferenceKind::classify("~/notes.md"), ReferenceKind::HomeRelativePath);
    /// assert_eq!(ReferenceKind::classify("!date"), ReferenceKind::Command);
    /// assert_eq!(ReferenceKind::classify("_includes/a.html"), ReferenceKind::ProjectRelativePath);
    /// ```
    pub fn classify(expanded: &str) -> Self {
        match expanded.chars().next() {
            Some('/') => Self::AbsolutePath,
            Some('~') => Self::HomeRelativePath,
            Some('!') => Self::Command,
            _ => Self::ProjectRelativePath,
        }
    }
}

/// Where content comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedReference {
    /// A file to read.
    File(PathBuf),
    /// A command line to run through the shell.
    Command(String),
}

impl ResolvedReference {
    /// Default block label: the file's basename, or the whole command line.
    pub fn label(&self) -> String {
        match self {
            Self::File(path) => path.file_name().map_or_else(
                || path.display().to_string(),
                |name| name.to_string_lossy().into_owned(),
            ),
            Self::Command(command) => command.clone(),
        }
    }
}

/// Resolves directive tokens against an access policy and project root.
pub struct ReferenceResolver<'a> {
    policy: &'a AccessPolicy,
    project_root: &'a Path,
    home: Option<PathBuf>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(policy: &'a AccessPolicy, project_root: &'a Path) -> Self {
        Self {
            policy,
            project_root,
            home: dirs::home_dir(),
        }
    }

    /// Use `home` instead of the user's home directory.
    #[must_use]
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Classify and resolve a raw filename token.
    ///
    /// # Errors
    ///
    /// - [`Failure::PathDenied`] when an absolute or home-relative path is not allowed
    /// - [`Failure::ExecutionDenied`] for commands while execution is disabled
    /// - [`Failure::NotFound`] for `~` references without a home directory, and
    ///   for `~name` references, which are not resolved
    pub fn resolve(&self, token: &str) -> Result<(ReferenceKind, ResolvedReference), Failure> {
        let raw = remove_quotes(token);
        let expanded = expand_env(raw);
        let kind = ReferenceKind::classify(&expanded);
        tracing::debug!(raw = %raw, expanded = %expanded, ?kind, "Classified reference");

        let reference = match kind {
            ReferenceKind::AbsolutePath => {
                self.check_access(&expanded)?;
                ResolvedReference::File(PathBuf::from(expanded))
            }
            ReferenceKind::HomeRelativePath => {
                let rest = if expanded == "~" {
                    ""
                } else if let Some(rest) = expanded.strip_prefix("~/") {
                    rest
                } else {
                    return Err(Failure::NotFound {
                        path: PathBuf::from(&expanded),
                        missing: Missing::UserHome,
                    });
                };
                let Some(home) = &self.home else {
                    return Err(Failure::NotFound {
                        path: PathBuf::from(&expanded),
                        missing: Missing::HomeDirectory,
                    });
                };
                let path = home.join(rest);
                self.check_access(&path.to_string_lossy())?;
                ResolvedReference::File(path)
            }
            ReferenceKind::Command => {
                let command = raw.strip_prefix('!').unwrap_or(raw).to_owned();
                if self.policy.execution_denied() {
                    return Err(Failure::ExecutionDenied { command });
                }
                ResolvedReference::Command(command)
            }
            ReferenceKind::ProjectRelativePath => {
                ResolvedReference::File(self.project_root.join(&expanded))
            }
        };

        Ok((kind, reference))
    }

    fn check_access(&self, path: &str) -> Result<(), Failure> {
        if self.policy.access_allowed(path) {
            Ok(())
        } else {
            Err(Failure::PathDenied {
                path: path.to_owned(),
            })
        }
    }
}
