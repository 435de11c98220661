//! Settings file loading and validation

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::debug;

/// Settings file names searched in the working directory
const SETTINGS_FILE_NAMES: &[&str] = &["ssm-inject.yaml", "ssm-inject.yml"];

/// Default placeholder prefix
pub const DEFAULT_PLACEHOLDER_PREFIX: &str = "%aws-ssm:";

/// Default placeholder suffix
pub const DEFAULT_PLACEHOLDER_SUFFIX: &str = "%";

/// Config parameter holding the access key id
pub const DEFAULT_ACCESS_KEY_PARAM: &str = "aws_ssm_access_key_id";

/// Config parameter holding the secret access key
pub const DEFAULT_SECRET_KEY_PARAM: &str = "aws_ssm_secret_access_key";

/// Config parameter holding the region
pub const DEFAULT_REGION_PARAM: &str = "aws_region";

/// Resolver settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub placeholder: PlaceholderPattern,
    pub credentials: CredentialParams,
    pub store: StoreSettings,
}

/// Literal text wrapped around a secret identifier, e.g. `%aws-ssm:db/password%`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderPattern {
    pub prefix: String,
    pub suffix: String,
}

impl Default for PlaceholderPattern {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PLACEHOLDER_PREFIX.to_string(),
            suffix: DEFAULT_PLACEHOLDER_SUFFIX.to_string(),
        }
    }
}

impl PlaceholderPattern {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Extract the identifier from a placeholder value.
    ///
    /// The value is trimmed first; it must start with the prefix, end with the
    /// suffix and be long enough to hold both. The identifier is whatever lies
    /// between them, untouched.
    pub fn extract<'a>(&self, value: &'a str) -> Option<&'a str> {
        let trimmed = value.trim();
        if trimmed.len() < self.prefix.len() + self.suffix.len() {
            return None;
        }
        if !trimmed.starts_with(&self.prefix) || !trimmed.ends_with(&self.suffix) {
            return None;
        }
        Some(&trimmed[self.prefix.len()..trimmed.len() - self.suffix.len()])
    }
}

/// Names of the config parameters that carry store credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialParams {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

impl Default for CredentialParams {
    fn default() -> Self {
        Self {
            access_key: DEFAULT_ACCESS_KEY_PARAM.to_string(),
            secret_key: DEFAULT_SECRET_KEY_PARAM.to_string(),
            region: DEFAULT_REGION_PARAM.to_string(),
        }
    }
}

/// Parameter store connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Endpoint override for SSM-compatible services (LocalStack etc.)
    pub endpoint: Option<String>,
    /// Request decrypted values for SecureString parameters
    pub with_decryption: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            with_decryption: true,
        }
    }
}

impl Settings {
    /// Load settings from the specified path, or search the usual locations.
    ///
    /// Falls back to defaults when no settings file exists. An explicit path
    /// that does not exist is an error.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let content = match path {
            Some(p) => Some(fs::read_to_string(p).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::config_not_found(p.as_str())
                } else {
                    Error::Io(e)
                }
            })?),
            None => match Self::find_settings() {
                Some(found) => {
                    debug!("Using settings file {}", found);
                    Some(fs::read_to_string(&found)?)
                }
                None => None,
            },
        };

        let settings = match content {
            Some(content) => Self::from_yaml(&content)?,
            None => {
                debug!("No settings file found, using defaults");
                Self::default()
            }
        };

        Ok(settings)
    }

    /// Parse and validate settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, treat it as all defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml_ng::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.placeholder.prefix.is_empty() {
            return Err(Error::invalid_config("placeholder.prefix must not be empty"));
        }
        for (field, value) in [
            ("credentials.access_key", &self.credentials.access_key),
            ("credentials.secret_key", &self.credentials.secret_key),
            ("credentials.region", &self.credentials.region),
        ] {
            if value.trim().is_empty() {
                return Err(Error::invalid_config(format!("{} must not be empty", field)));
            }
        }
        if let Some(endpoint) = &self.store.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(Error::invalid_config(format!(
                    "store.endpoint must be an http(s) URL, got '{}'",
                    endpoint
                )));
            }
        }
        Ok(())
    }

    fn find_settings() -> Option<Utf8PathBuf> {
        let cwd = std::env::current_dir()
            .ok()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .unwrap_or_else(|| Utf8PathBuf::from("."));

        for name in SETTINGS_FILE_NAMES {
            let candidate = cwd.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        let user_settings = dirs::config_dir()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .map(|p| p.join("ssm-inject").join("config.yaml"))?;
        user_settings.exists().then_some(user_settings)
    }
}
