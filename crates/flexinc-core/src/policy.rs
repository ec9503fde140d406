//! Access policy: the path allow-list and the command execution kill switch.
//!
//! ```text
//! FLEXIBLE_INCLUDE_PATHS='~/lib/.*:.*:$WORK/.*'
//! ```
//!
//! compiles to the patterns `/home/me/lib/.*`, `/current/dir/.*` and
//! `/work/dir/.*`. Matching is an unanchored regex search, so a pattern also
//! matches any path that merely contains it.
//!
//! A policy is compiled once and never mutated afterwards. [`PolicyCell`]
//! provides the single initialization point for hosts that share one policy
//! across threads.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use flexinc_config::SecurityConfig;
use regex::Regex;

use crate::expand::{UnsetVar, normalize_path, try_normalize_path};

/// Environment variable holding the colon-separated allow-list.
pub const INCLUDE_PATHS_VAR: &str = "FLEXIBLE_INCLUDE_PATHS";

/// Environment variable that disables `!command` references when set.
pub const DISABLE_EXECUTION_VAR: &str = "DISABLE_FLEXIBLE_INCLUDE";

/// Uncompiled policy inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicySettings {
    /// Colon-separated pattern list; `None` allows every path.
    pub include_paths: Option<String>,
    /// Whether `!command` references are refused.
    pub execution_disabled: bool,
}

impl PolicySettings {
    /// Read settings from the environment, falling back to `[security]` config
    /// values for variables that are unset.
    pub fn from_env_or(fallback: &SecurityConfig) -> Self {
        let include_paths = std::env::var(INCLUDE_PATHS_VAR)
            .ok()
            .or_else(|| fallback.include_paths.clone());
        let execution_disabled = match std::env::var(DISABLE_EXECUTION_VAR) {
            Ok(value) => is_truthy(&value),
            Err(_) => fallback.disable_execution,
        };
        Self {
            include_paths,
            execution_disabled,
        }
    }
}

/// Any value except empty, `0`, `false`, `no` and `off` disables execution.
fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty()
        || value == "0"
        || value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("no")
        || value.eq_ignore_ascii_case("off"))
}

/// Compiled access policy.
#[derive(Debug, Default)]
pub struct AccessPolicy {
    /// `None` when no allow-list was configured.
    patterns: Option<Vec<Regex>>,
    execution_disabled: bool,
}

impl AccessPolicy {
    /// A policy that permits every path and command.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Compile settings, resolving relative patterns against the working directory.
    pub fn compile(settings: &PolicySettings) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self::compile_with_base(settings, &cwd)
    }

    /// Compile settings, resolving relative patterns against `base`.
    ///
    /// Patterns that reference an undefined variable or are not valid regular
    /// expressions are logged and dropped. A configured list whose patterns
    /// are all dropped denies every path.
    pub fn compile_with_base(settings: &PolicySettings, base: &Path) -> Self {
        let patterns = settings.include_paths.as_deref().map(|raw| {
            raw.split(':')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .filter_map(|segment| compile_pattern(segment, base))
                .collect::<Vec<_>>()
        });

        if let Some(patterns) = &patterns {
            tracing::debug!(count = patterns.len(), "Compiled include path patterns");
        }

        Self {
            patterns,
            execution_disabled: settings.execution_disabled,
        }
    }

    /// Whether `path` may be read.
    ///
    /// The path receives the same environment and `~` expansion as the
    /// patterns did before matching.
    pub fn access_allowed(&self, path: &str) -> bool {
        let Some(patterns) = &self.patterns else {
            return true;
        };
        let normalized = normalize_path(path);
        patterns.iter().any(|re| re.is_match(&normalized))
    }

    /// Whether `!command` references are refused.
    pub fn execution_denied(&self) -> bool {
        self.execution_disabled
    }

    /// Whether an allow-list is in force.
    pub fn is_restricted(&self) -> bool {
        self.patterns.is_some()
    }

    /// Compiled pattern sources, in configuration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().flatten().map(Regex::as_str)
    }
}

fn compile_pattern(segment: &str, base: &Path) -> Option<Regex> {
    let normalized = match try_normalize_path(segment) {
        Ok(normalized) => normalized,
        Err(UnsetVar(var)) => {
            tracing::warn!(pattern = %segment, var = %var, "Ignoring include path pattern with undefined variable");
            return None;
        }
    };
    let absolute = if normalized.starts_with('/') {
        normalized
    } else {
        base.join(&normalized).to_string_lossy().into_owned()
    };

    match Regex::new(&absolute) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(pattern = %absolute, error = %e, "Ignoring invalid include path pattern");
            None
        }
    }
}

/// One-time, thread-safe initialization point for a shared [`AccessPolicy`].
///
/// Concurrent first calls race on [`OnceLock`]; exactly one closure runs and
/// every caller observes the same fully compiled policy.
///
/// ```
/// use flexinc_core::{PolicyCell, PolicySettings};
///
/// static POLICY: PolicyCell = PolicyCell::new();
///
/// let policy = POLICY.initialize(PolicySettings::default);
/// assert!(policy.access_allowed("/anything"));
/// ```
#[derive(Debug, Default)]
pub struct PolicyCell {
    cell: OnceLock<Arc<AccessPolicy>>,
}

impl PolicyCell {
    /// Create an empty cell.
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Compile the policy on first use; later calls return the existing policy
    /// and never invoke `settings`.
    pub fn initialize<F>(&self, settings: F) -> Arc<AccessPolicy>
    where
        F: FnOnce() -> PolicySettings,
    {
        Arc::clone(
            self.cell
                .get_or_init(|| Arc::new(AccessPolicy::compile(&settings()))),
        )
    }

    /// The policy, if it has been initialized.
    pub fn get(&self) -> Option<Arc<AccessPolicy>> {
        self.cell.get().map(Arc::clone)
    }

    /// Drop the compiled policy so the next [`initialize`](Self::initialize) recompiles.
    pub fn reset(&mut self) {
        self.cell.take();
    }
}
