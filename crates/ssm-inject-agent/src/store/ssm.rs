//! AWS Systems Manager Parameter Store backend

use crate::store::{SecretStore, StoreConnector, StoreCredentials};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ssm::config::{Credentials, Region};
use aws_sdk_ssm::error::{DisplayErrorContext, SdkError};
use aws_sdk_ssm::Client;
use ssm_inject_core::config::StoreSettings;
use ssm_inject_core::{Error, Result, SecureString};
use tracing::debug;

/// Provider name attached to static credentials taken from build parameters
const CREDENTIALS_PROVIDER_NAME: &str = "ssm-inject-build-parameters";

/// Opens [`SsmStore`] connections
#[derive(Debug, Clone, Default)]
pub struct SsmConnector {
    settings: StoreSettings,
}

impl SsmConnector {
    pub fn new(settings: StoreSettings) -> Self {
        Self { settings }
    }

    async fn create_client(&self, credentials: &StoreCredentials) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &credentials.region {
            loader = loader.region(Region::new(region.clone()));
        }

        // Fall back to the default provider chain unless the build carries a full key pair
        if let (Some(access_key), Some(secret_key)) =
            (&credentials.access_key_id, &credentials.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.as_str().to_string(),
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        } else {
            debug!("No static key pair in build parameters, using default credential chain");
        }

        let sdk_config = loader.load().await;
        let mut ssm_config_builder = aws_sdk_ssm::config::Builder::from(&sdk_config);

        if let Some(endpoint_url) = &self.settings.endpoint {
            debug!("Using custom SSM endpoint: {}", endpoint_url);
            ssm_config_builder = ssm_config_builder.endpoint_url(endpoint_url);
        }

        Client::from_conf(ssm_config_builder.build())
    }
}

#[async_trait]
impl StoreConnector for SsmConnector {
    async fn connect(&self, credentials: &StoreCredentials) -> Result<Box<dyn SecretStore>> {
        debug!(
            "Opening SSM client (region: {})",
            credentials.region.as_deref().unwrap_or("default chain")
        );
        let client = self.create_client(credentials).await;
        Ok(Box::new(SsmStore::from_client(
            client,
            self.settings.with_decryption,
        )))
    }
}

/// An SSM client scoped to one resolution cycle
pub struct SsmStore {
    client: Client,
    with_decryption: bool,
}

impl SsmStore {
    /// Wrap an already configured client
    pub fn from_client(client: Client, with_decryption: bool) -> Self {
        Self {
            client,
            with_decryption,
        }
    }
}

/// Errors returned by the service become [`Error::Service`]; dispatch, timeout
/// and request construction failures become [`Error::Client`]
fn classify_sdk_error<E, R>(identifier: &str, err: SdkError<E, R>) -> Error
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug + 'static,
{
    match err {
        SdkError::ServiceError(context) => {
            Error::service(identifier, DisplayErrorContext(context.err()).to_string())
        }
        other => Error::client(identifier, DisplayErrorContext(&other).to_string()),
    }
}

#[async_trait]
impl SecretStore for SsmStore {
    async fn get_parameter(&self, identifier: &str) -> Result<SecureString> {
        let resp = self
            .client
            .get_parameter()
            .name(identifier)
            .with_decryption(self.with_decryption)
            .send()
            .await
            .map_err(|e| classify_sdk_error(identifier, e))?;

        resp.parameter
            .and_then(|p| p.value)
            .map(SecureString::new)
            .ok_or_else(|| Error::missing_value(identifier))
    }

    fn name(&self) -> &'static str {
        "aws-ssm"
    }
}

impl Drop for SsmStore {
    fn drop(&mut self) {
        debug!("Releasing SSM client");
    }
}
