//! Parameter store boundary
//!
//! The resolver only needs two capabilities: open a connection with the
//! build's credentials, and read one decrypted parameter by name.

pub mod ssm;

use async_trait::async_trait;
use ssm_inject_core::config::CredentialParams;
use ssm_inject_core::{ParameterMap, Result, SecureString};
use std::fmt;

pub use ssm::{SsmConnector, SsmStore};

/// An open connection to a key-value secret store.
///
/// The connection is released when the value is dropped.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the plaintext value stored under `identifier`
    async fn get_parameter(&self, identifier: &str) -> Result<SecureString>;

    /// Store name for diagnostics
    fn name(&self) -> &'static str;
}

/// Opens store connections
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, credentials: &StoreCredentials) -> Result<Box<dyn SecretStore>>;
}

/// Credentials read from the build's config parameters.
///
/// Presence is not checked here: a missing key surfaces as an
/// authentication failure from the store.
#[derive(Clone, Default)]
pub struct StoreCredentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<SecureString>,
    pub region: Option<String>,
}

impl StoreCredentials {
    /// Read credentials from config parameters using the configured key names
    pub fn from_parameters(config: &ParameterMap, names: &CredentialParams) -> Self {
        Self {
            access_key_id: config.get(&names.access_key).cloned(),
            secret_access_key: config
                .get(&names.secret_key)
                .map(|s| SecureString::from(s.as_str())),
            region: config.get(&names.region).cloned(),
        }
    }

    /// Both halves of a static key pair are present
    pub fn has_static_keys(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }
}

impl fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("region", &self.region)
            .finish()
    }
}
