//! In-memory host and store doubles for unit tests

use crate::build::{BuildLog, RunningBuild};
use crate::store::SecretStore;
use async_trait::async_trait;
use ssm_inject_core::{Error, ParameterMap, Result, SecureString};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryLog {
    pub messages: Vec<String>,
}

impl BuildLog for MemoryLog {
    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Env(String, String),
    System(String, String),
    Config(String, String),
    Mask(String),
}

#[derive(Debug, Default)]
pub struct RecordingBuild {
    pub config: ParameterMap,
    pub build: ParameterMap,
    pub calls: Vec<HostCall>,
    pub log: Vec<String>,
    pub reject_system_properties: bool,
}

impl RecordingBuild {
    pub fn masked(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Mask(v) => Some(v.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl BuildLog for RecordingBuild {
    fn message(&mut self, text: &str) {
        self.log.push(text.to_string());
    }
}

impl RunningBuild for RecordingBuild {
    fn shared_config_parameters(&self) -> &ParameterMap {
        &self.config
    }

    fn shared_build_parameters(&self) -> &ParameterMap {
        &self.build
    }

    fn add_environment_variable(&mut self, name: &str, value: &str) -> Result<()> {
        self.calls.push(HostCall::Env(name.into(), value.into()));
        Ok(())
    }

    fn add_system_property(&mut self, name: &str, value: &str) -> Result<()> {
        if self.reject_system_properties {
            return Err(Error::host("add_system_property", "read-only build"));
        }
        self.calls.push(HostCall::System(name.into(), value.into()));
        Ok(())
    }

    fn add_config_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        self.calls.push(HostCall::Config(name.into(), value.into()));
        Ok(())
    }

    fn mask_value(&mut self, value: &str) {
        self.calls.push(HostCall::Mask(value.into()));
    }
}

/// Store answering from a fixed table; unknown identifiers are a service error
#[derive(Default)]
pub struct MockStore {
    values: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MockStore {
    pub fn with_values(values: &[(&str, &str)]) -> Self {
        Self {
            values: values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretStore for MockStore {
    async fn get_parameter(&self, identifier: &str) -> Result<SecureString> {
        self.requests.lock().unwrap().push(identifier.to_string());
        self.values
            .get(identifier)
            .map(|v| SecureString::from(v.as_str()))
            .ok_or_else(|| Error::service(identifier, "ParameterNotFound"))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
