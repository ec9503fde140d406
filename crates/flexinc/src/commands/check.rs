//! `flexinc check` command implementation.

use std::path::PathBuf;

use clap::Args;
use flexinc_config::Config;

use super::access_policy;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Path to test against the allow-list.
    path: String,

    /// Path to configuration file (default: auto-discover flexinc.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl CheckArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), None)?;
        let policy = access_policy(&config);

        if policy.is_restricted() {
            output.info("Allowed patterns:");
            for pattern in policy.patterns() {
                output.detail(&format!("  {pattern}"));
            }
        } else {
            output.info("No allow-list configured; every path is allowed");
        }

        if policy.execution_denied() {
            output.warning("Command execution is disabled");
        } else {
            output.info("Command execution is enabled");
        }

        if !policy.access_allowed(&self.path) {
            return Err(CliError::AccessDenied(self.path));
        }
        output.success(&format!("Access to {} is allowed", self.path));
        Ok(())
    }
}
