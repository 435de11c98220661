//! Command implementations

pub mod detect;
pub mod exec;
pub mod resolve;

use anyhow::{Context, Result};
use camino::Utf8Path;
use ssm_inject_core::Settings;

use crate::cli::ParamsArgs;
use crate::local_build::{LocalBuild, ParametersFile};

/// Load settings from `--config`, the working directory or the user config dir
pub fn load_settings(path: Option<&Utf8Path>) -> Result<Settings> {
    Settings::load(path).context("Failed to load settings")
}

/// Assemble the local build described by the parameter flags
pub fn load_build(args: &ParamsArgs) -> Result<LocalBuild> {
    let params = args
        .params
        .as_deref()
        .map(ParametersFile::load)
        .transpose()?;

    if params.is_none() && !args.inherit_env {
        crate::output::warning("No --params file and no --inherit-env: nothing to resolve");
    }

    LocalBuild::from_sources(params, args.inherit_env)
}
