//! Capabilities a build host exposes to the resolver

use ssm_inject_core::{ParameterMap, Result};

/// Sink for human-readable build log messages
pub trait BuildLog: Send {
    fn message(&mut self, text: &str);
}

/// The build currently starting on the agent.
///
/// Reads give access to the host's shared parameters; writes are scoped to
/// this build only.
pub trait RunningBuild: BuildLog {
    /// Configuration parameters, also the source of store credentials
    fn shared_config_parameters(&self) -> &ParameterMap;

    /// Build parameters (`env.*` and `system.*` keys)
    fn shared_build_parameters(&self) -> &ParameterMap;

    fn add_environment_variable(&mut self, name: &str, value: &str) -> Result<()>;

    fn add_system_property(&mut self, name: &str, value: &str) -> Result<()>;

    fn add_config_parameter(&mut self, name: &str, value: &str) -> Result<()>;

    /// Register a plaintext value that must be redacted from build output
    fn mask_value(&mut self, value: &str);
}
