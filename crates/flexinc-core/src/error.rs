//! Failure taxonomy and the policy that turns failures into output or fatal errors.
//!
//! Every stage returns a typed [`Failure`]. [`ErrorPolicy::handle`] is the
//! single decision point: depending on the configured `die_on_*` flags a
//! failure becomes either an inline error marker (rendering continues) or an
//! [`IncludeError`] for the host to abort the document with.

use std::io;
use std::path::PathBuf;

use flexinc_config::ErrorConfig;

use crate::directive::SourceLocation;
use crate::transform::escape_html;

/// Why a file could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    /// The file itself does not exist.
    File,
    /// The directory that should contain the file does not exist.
    Directory(PathBuf),
    /// A `~` reference could not be resolved because there is no home directory.
    HomeDirectory,
    /// `~name` references to another user's home are not resolved.
    UserHome,
}

/// A failure anywhere in the include pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// Path rejected by the allow-list.
    #[error("Access to {path} denied by FLEXIBLE_INCLUDE_PATHS value.")]
    PathDenied {
        /// The path as it was checked.
        path: String,
    },
    /// Command references are disabled.
    #[error("Arbitrary command execution denied by DISABLE_FLEXIBLE_INCLUDE value.")]
    ExecutionDenied {
        /// The refused command line.
        command: String,
    },
    /// File (or its directory) does not exist.
    #[error("{}", describe_missing(path, missing))]
    NotFound {
        /// Requested file.
        path: PathBuf,
        /// What exactly is missing.
        missing: Missing,
    },
    /// File exists but cannot be read.
    #[error("{} is not readable: {source}", path.display())]
    NotReadable {
        /// Requested file.
        path: PathBuf,
        /// Underlying platform error.
        source: io::Error,
    },
    /// `!` with nothing after it.
    #[error("Empty command string")]
    EmptyCommand,
    /// Command could not be spawned or exited unsuccessfully.
    #[error("Command `{command}` failed: {message}")]
    RunFailure {
        /// The command line.
        command: String,
        /// Spawn error or exit status with captured stderr.
        message: String,
    },
    /// Loaded data is not text.
    #[error("{what} is not valid UTF-8 text")]
    TypeMismatch {
        /// Description of the data source.
        what: String,
    },
    /// Malformed directive markup or options.
    #[error("Invalid directive: {message}")]
    InvalidOption {
        /// What is wrong.
        message: String,
    },
}

fn describe_missing(path: &std::path::Path, missing: &Missing) -> String {
    match missing {
        Missing::File => format!("{} does not exist", path.display()),
        Missing::Directory(dir) => format!(
            "{} cannot be read because directory {} does not exist",
            path.display(),
            dir.display()
        ),
        Missing::HomeDirectory => format!(
            "{} cannot be resolved because the home directory is unknown",
            path.display()
        ),
        Missing::UserHome => format!(
            "{} cannot be resolved because only ~/ is supported for home directories",
            path.display()
        ),
    }
}

/// Failure category, as routed by [`ErrorPolicy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    PathDenied,
    ExecutionDenied,
    NotFound,
    NotReadable,
    EmptyCommand,
    RunFailure,
    TypeMismatch,
    InvalidOption,
}

impl Failure {
    /// Category of this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::PathDenied { .. } => FailureKind::PathDenied,
            Self::ExecutionDenied { .. } => FailureKind::ExecutionDenied,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::NotReadable { .. } => FailureKind::NotReadable,
            Self::EmptyCommand => FailureKind::EmptyCommand,
            Self::RunFailure { .. } => FailureKind::RunFailure,
            Self::TypeMismatch { .. } => FailureKind::TypeMismatch,
            Self::InvalidOption { .. } => FailureKind::InvalidOption,
        }
    }

    /// Platform error category for filesystem failures.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::NotFound { .. } => Some(io::ErrorKind::NotFound),
            Self::NotReadable { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

/// Fatal include error surfaced to the host template engine.
///
/// The message always names the originating document and line.
#[derive(Debug, thiserror::Error)]
#[error("{failure} on {location}")]
pub struct IncludeError {
    #[source]
    failure: Failure,
    location: SourceLocation,
}

impl IncludeError {
    /// Failure category.
    pub fn kind(&self) -> FailureKind {
        self.failure.kind()
    }

    /// The underlying failure.
    pub fn failure(&self) -> &Failure {
        &self.failure
    }

    /// Where the directive appears.
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Platform error category for filesystem failures.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        self.failure.io_kind()
    }
}

/// Routes failures to inline markers or fatal errors according to [`ErrorConfig`].
///
/// | Category | Governing flag |
/// |----------|----------------|
/// | `PathDenied`, `ExecutionDenied` | `die_on_path_denied` |
/// | `NotFound`, `NotReadable`, `TypeMismatch` | `die_on_file_error` |
/// | `RunFailure` | `die_on_run_error` |
/// | `EmptyCommand` | `die_on_run_error`, else `die_on_other_error` |
/// | `InvalidOption` | `die_on_other_error` |
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorPolicy {
    config: ErrorConfig,
}

impl ErrorPolicy {
    pub fn new(config: ErrorConfig) -> Self {
        Self { config }
    }

    /// Whether failures of `kind` abort rendering.
    pub fn is_fatal(&self, kind: FailureKind) -> bool {
        let c = &self.config;
        match kind {
            FailureKind::PathDenied | FailureKind::ExecutionDenied => c.die_on_path_denied,
            FailureKind::NotFound | FailureKind::NotReadable | FailureKind::TypeMismatch => {
                c.die_on_file_error
            }
            FailureKind::RunFailure => c.die_on_run_error,
            FailureKind::EmptyCommand => c.die_on_run_error || c.die_on_other_error,
            FailureKind::InvalidOption => c.die_on_other_error,
        }
    }

    /// Log `failure`, then either return an inline marker or a fatal error.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError`] when the governing flag is set.
    pub fn handle(&self, failure: Failure, location: &SourceLocation) -> Result<String, IncludeError> {
        let kind = failure.kind();
        let fatal = self.is_fatal(kind);
        tracing::error!(kind = ?kind, fatal, "{} - {failure} ({location})", location.document_display());

        if fatal {
            return Err(IncludeError {
                failure,
                location: location.clone(),
            });
        }
        Ok(marker(&failure, location))
    }
}

/// Inline error markup. Denials carry only the message; everything else
/// names the source location.
fn marker(failure: &Failure, location: &SourceLocation) -> String {
    match failure.kind() {
        FailureKind::PathDenied | FailureKind::ExecutionDenied => {
            format!("<p class='flexible_error'>{}</p>", escape_html(&failure.to_string()))
        }
        FailureKind::EmptyCommand | FailureKind::RunFailure => format!(
            "<span class='flexible_error'>{}</span>",
            escape_html(&format!("{failure} on {location}"))
        ),
        FailureKind::NotFound
        | FailureKind::NotReadable
        | FailureKind::TypeMismatch
        | FailureKind::InvalidOption => format!(
            "<div class='flexible_error'>{}</div>",
            escape_html(&format!("{failure} on {location}"))
        ),
    }
}
