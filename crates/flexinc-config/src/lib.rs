//! Configuration management for flexinc.
//!
//! Parses `flexinc.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ```toml
//! [project]
//! source_dir = "site"
//!
//! [errors]
//! die_on_file_error = true
//! die_on_path_denied = false
//! die_on_run_error = false
//! die_on_other_error = false
//!
//! [security]
//! include_paths = "~/lib/.*:${WORK}/.*"
//! disable_execution = false
//! ```
//!
//! The `[security]` values are fallbacks: the `FLEXIBLE_INCLUDE_PATHS` and
//! `DISABLE_FLEXIBLE_INCLUDE` environment variables take precedence when set.
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `project.source_dir`
//! - `security.include_paths`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the project root directory.
    pub source_dir: Option<PathBuf>,
    /// Turn every error category fatal.
    pub die_on_error: bool,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "flexinc.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project configuration (paths are relative strings from TOML).
    project: ProjectConfigRaw,
    /// Per-category error handling.
    pub errors: ErrorConfig,
    /// Access policy fallbacks.
    pub security: SecurityConfig,

    /// Resolved project configuration (set after loading).
    #[serde(skip)]
    pub project_resolved: ProjectConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw project configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ProjectConfigRaw {
    source_dir: Option<String>,
}

/// Resolved project configuration with absolute paths.
#[derive(Debug, Default)]
pub struct ProjectConfig {
    /// Root directory that project-relative references are joined to.
    pub source_dir: PathBuf,
}

/// Which failure categories abort rendering instead of producing an inline marker.
///
/// Every flag defaults to `false`: failures render inline and the document
/// keeps rendering.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ErrorConfig {
    /// Missing, unreadable or non-text files.
    pub die_on_file_error: bool,
    /// Paths rejected by the allow-list and disabled command execution.
    pub die_on_path_denied: bool,
    /// Commands that fail to run or exit unsuccessfully.
    pub die_on_run_error: bool,
    /// Everything else: empty commands, malformed options.
    pub die_on_other_error: bool,
}

impl ErrorConfig {
    /// Configuration with every category fatal.
    #[must_use]
    pub fn all_fatal() -> Self {
        Self {
            die_on_file_error: true,
            die_on_path_denied: true,
            die_on_run_error: true,
            die_on_other_error: true,
        }
    }
}

/// Access policy fallbacks used when the environment does not provide them.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Colon-separated list of path patterns, same syntax as `FLEXIBLE_INCLUDE_PATHS`.
    pub include_paths: Option<String>,
    /// Disable `!command` references.
    pub disable_execution: bool,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`project.source_dir`").
        field: String,
        /// Error message (e.g., "${`WORK`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `flexinc.toml` in current directory and parents,
    /// falling back to defaults rooted at the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.project_resolved.source_dir.clone_from(source_dir);
        }
        if settings.die_on_error {
            self.errors = ErrorConfig::all_fatal();
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with the project root at `base`.
    pub fn default_with_base(base: &Path) -> Self {
        Self {
            project: ProjectConfigRaw::default(),
            errors: ErrorConfig::default(),
            security: SecurityConfig::default(),
            project_resolved: ProjectConfig {
                source_dir: base.to_path_buf(),
            },
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_resolved.source_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "project.source_dir cannot be empty".to_owned(),
            ));
        }
        if let Some(paths) = &self.security.include_paths
            && paths.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "security.include_paths cannot be empty; omit it to allow all paths".to_owned(),
            ));
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.project.source_dir {
            self.project.source_dir = Some(expand::expand_env(dir, "project.source_dir")?);
        }
        if let Some(ref paths) = self.security.include_paths {
            self.security.include_paths =
                Some(expand::expand_env(paths, "security.include_paths")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config file directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let source_dir = match self.project.source_dir.as_deref() {
            Some(dir) => config_dir.join(dir),
            None => config_dir.to_path_buf(),
        };
        self.project_resolved = ProjectConfig { source_dir };
    }
}
