//! `flexinc render` command implementation.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Args;
use flexinc_config::{CliSettings, Config};
use flexinc_core::FlexibleInclude;
use flexinc_core::directive::IncludeContext;

use super::access_policy;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Directive markup, e.g. `"src/main.rs number from='^fn main'"`.
    markup: String,

    /// Path to configuration file (default: auto-discover flexinc.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root for relative references (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Document the directive appears in, for error messages.
    #[arg(short, long)]
    document: Option<PathBuf>,

    /// Line of the directive in the document.
    #[arg(short, long, default_value_t = 1)]
    line: usize,

    /// Template variable visible to `{{name}}` references.
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    vars: Vec<(String, String)>,

    /// Treat every failure as fatal.
    #[arg(long)]
    die_on_error: bool,
}

impl RenderArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            die_on_error: self.die_on_error,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        config.validate()?;

        if let Some(path) = &config.config_path {
            tracing::debug!(config = %path.display(), "Loaded configuration");
        }

        let include = FlexibleInclude::from_config(&config, access_policy(&config));
        let scope: HashMap<String, String> = self.vars.into_iter().collect();
        let ctx = IncludeContext {
            document: self.document.as_deref(),
            line: self.line,
            scope: None,
        }
        .with_scope(&scope);

        let rendered = include.render(&self.markup, &ctx)?;
        output.content(&rendered)?;
        Ok(())
    }
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{s}`"))?;
    if name.is_empty() {
        return Err(format!("empty variable name in `{s}`"));
    }
    Ok((name.to_owned(), value.to_owned()))
}
