//! Routing of resolved values into the build
//!
//! A key's category marker decides where its value goes:
//! - `env.NAME`    → environment variable `NAME`
//! - `system.NAME` → system property `NAME`
//! - anything else → config parameter with the full key

use crate::build::RunningBuild;
use ssm_inject_core::{ResolvedSecret, Result};
use tracing::debug;

/// Category marker for environment variables
pub const ENV_PARAMETER_PREFIX: &str = "env";

/// Category marker for system properties
pub const SYSTEM_PARAMETER_PREFIX: &str = "system";

/// Separator between a category marker and the destination name
pub const CATEGORY_SEPARATOR: char = '.';

/// Where a resolved value is written, with the destination name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination<'a> {
    EnvironmentVariable(&'a str),
    SystemProperty(&'a str),
    ConfigParameter(&'a str),
}

impl<'a> Destination<'a> {
    /// Classify a parameter key.
    ///
    /// Markers are matched together with the separator, so `envFOO` is a
    /// config parameter. A bare marker such as `env.` has no name to write
    /// to and is kept as a config parameter too.
    pub fn classify(key: &'a str) -> Self {
        if let Some(name) = strip_marker(key, ENV_PARAMETER_PREFIX) {
            Destination::EnvironmentVariable(name)
        } else if let Some(name) = strip_marker(key, SYSTEM_PARAMETER_PREFIX) {
            Destination::SystemProperty(name)
        } else {
            Destination::ConfigParameter(key)
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Destination::EnvironmentVariable(name)
            | Destination::SystemProperty(name)
            | Destination::ConfigParameter(name) => name,
        }
    }

    /// Short label used in diagnostics and CLI output
    pub fn category(&self) -> &'static str {
        match self {
            Destination::EnvironmentVariable(_) => "environment",
            Destination::SystemProperty(_) => "system",
            Destination::ConfigParameter(_) => "config",
        }
    }
}

fn strip_marker<'a>(key: &'a str, marker: &str) -> Option<&'a str> {
    key.strip_prefix(marker)?
        .strip_prefix(CATEGORY_SEPARATOR)
        .filter(|name| !name.is_empty())
}

/// Write every resolved value into the build and register it for masking.
///
/// Each value is masked exactly once, after its write. A failing write stops
/// the dispatch and is returned to the caller.
pub fn dispatch<B>(build: &mut B, secrets: Vec<ResolvedSecret>) -> Result<()>
where
    B: RunningBuild + ?Sized,
{
    for secret in secrets {
        let destination = Destination::classify(&secret.key);
        let value = secret.value.as_str();

        match destination {
            Destination::EnvironmentVariable(name) => build.add_environment_variable(name, value)?,
            Destination::SystemProperty(name) => build.add_system_property(name, value)?,
            Destination::ConfigParameter(name) => build.add_config_parameter(name, value)?,
        }
        build.mask_value(value);

        debug!(
            "Set {} parameter {} from {}",
            destination.category(),
            destination.name(),
            secret.key
        );
    }

    Ok(())
}
