//! A build host backed by a parameters file and the process environment

use anyhow::{bail, Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use ssm_inject_agent::{BuildLog, Destination, RunningBuild};
use ssm_inject_core::{Error, OutputMasker, ParameterMap};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Prefix given to inherited process environment variables
const INHERITED_ENV_PREFIX: &str = "env.";

/// Parameters file layout:
///
/// ```yaml
/// config:
///   aws_region: us-east-1
/// build:
///   env.DB_PASSWORD: "%aws-ssm:/prod/db/password%"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParametersFile {
    pub config: BTreeMap<String, Value>,
    pub build: BTreeMap<String, Value>,
}

impl ParametersFile {
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read parameters file: {}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid parameters file: {}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(content)?)
    }
}

/// Scalars are accepted as written (`22`, `true`); nested values are not
fn scalar_map(values: BTreeMap<String, Value>, section: &str) -> Result<ParameterMap> {
    values
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                _ => bail!("{}.{} must be a string, number or boolean", section, key),
            };
            Ok((key, text))
        })
        .collect()
}

/// Process environment as build parameters. Variables whose name or value is
/// not valid UTF-8 cannot hold a placeholder and are skipped.
fn inherited_environment() -> ParameterMap {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((format!("{}{}", INHERITED_ENV_PREFIX, key), value)),
            (Ok(key), Err(_)) => {
                warn!("Skipping environment variable {}: value is not valid UTF-8", key);
                None
            }
            (Err(key), _) => {
                warn!("Skipping environment variable {:?}: name is not valid UTF-8", key);
                None
            }
        })
        .collect()
}

/// One value written into the build
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub category: &'static str,
    pub name: String,
    pub value: String,
}

#[derive(Debug)]
pub struct LocalBuild {
    config: ParameterMap,
    build: ParameterMap,
    environment: BTreeMap<String, String>,
    system_properties: BTreeMap<String, String>,
    config_parameters: BTreeMap<String, String>,
    masker: OutputMasker,
    log: Vec<String>,
    echo: bool,
}

impl LocalBuild {
    pub fn new(config: ParameterMap, build: ParameterMap) -> Self {
        Self {
            config,
            build,
            environment: BTreeMap::new(),
            system_properties: BTreeMap::new(),
            config_parameters: BTreeMap::new(),
            masker: OutputMasker::new(),
            log: Vec::new(),
            echo: false,
        }
    }

    /// Assemble the build from a parameters file and, optionally, the process
    /// environment. File entries win over inherited variables.
    pub fn from_sources(params: Option<ParametersFile>, inherit_env: bool) -> Result<Self> {
        let mut build = ParameterMap::new();
        if inherit_env {
            build.extend(inherited_environment());
        }

        let params = params.unwrap_or_default();
        let config = scalar_map(params.config, "config")?;
        build.extend(scalar_map(params.build, "build")?);

        Ok(Self::new(config, build))
    }

    /// Print build log lines to the terminal as they arrive
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    #[cfg(test)]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// Hand the masker over, e.g. to filter a child process' output
    pub fn into_masker(self) -> Arc<OutputMasker> {
        Arc::new(self.masker)
    }

    /// Everything written during the build, grouped by category
    pub fn assignments(&self) -> Vec<Assignment> {
        let groups = [
            ("environment", &self.environment),
            ("system", &self.system_properties),
            ("config", &self.config_parameters),
        ];
        groups
            .into_iter()
            .flat_map(|(category, values)| {
                values.iter().map(move |(name, value)| Assignment {
                    category,
                    name: name.clone(),
                    value: value.clone(),
                })
            })
            .collect()
    }
}

fn validate_env_name(name: &str) -> ssm_inject_core::Result<()> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(Error::host(
            "add_environment_variable",
            format!("'{}' is not a valid environment variable name", name),
        ));
    }
    Ok(())
}

impl BuildLog for LocalBuild {
    fn message(&mut self, text: &str) {
        let masked = self.masker.mask(text);
        if self.echo {
            crate::output::build_log(&masked);
        }
        self.log.push(masked);
    }
}

impl RunningBuild for LocalBuild {
    fn shared_config_parameters(&self) -> &ParameterMap {
        &self.config
    }

    fn shared_build_parameters(&self) -> &ParameterMap {
        &self.build
    }

    fn add_environment_variable(&mut self, name: &str, value: &str) -> ssm_inject_core::Result<()> {
        validate_env_name(name)?;
        if value.contains('\0') {
            return Err(Error::host(
                "add_environment_variable",
                format!("value of {} contains a NUL byte", name),
            ));
        }
        self.environment.insert(name.to_string(), value.to_string());
        self.build
            .insert(format!("{}{}", INHERITED_ENV_PREFIX, name), value.to_string());
        Ok(())
    }

    fn add_system_property(&mut self, name: &str, value: &str) -> ssm_inject_core::Result<()> {
        self.system_properties
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn add_config_parameter(&mut self, name: &str, value: &str) -> ssm_inject_core::Result<()> {
        self.config_parameters
            .insert(name.to_string(), value.to_string());
        self.config.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn mask_value(&mut self, value: &str) {
        self.masker.add_password(value);
    }
}

/// Destination label for a key, shared by `detect` output
pub fn destination_label(key: &str) -> String {
    let destination = Destination::classify(key);
    format!("{} {}", destination.category(), destination.name())
}
