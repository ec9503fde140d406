//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod render;

use std::sync::Arc;

use flexinc_config::Config;
use flexinc_core::{AccessPolicy, PolicyCell, PolicySettings};

pub(crate) use check::CheckArgs;
pub(crate) use render::RenderArgs;

static POLICY: PolicyCell = PolicyCell::new();

/// The process-wide access policy, compiled on first use from the
/// environment with `[security]` config values as fallbacks.
fn access_policy(config: &Config) -> Arc<AccessPolicy> {
    POLICY.initialize(|| PolicySettings::from_env_or(&config.security))
}
