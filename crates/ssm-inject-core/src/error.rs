//! Error types for ssm-inject

use thiserror::Error;

/// Result type alias using ssm-inject-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes a resolution cycle distinguishes when reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The parameter store rejected the request
    Service,
    /// The request never produced a service response (transport, timeout, SDK client)
    Client,
    /// Anything else
    Other,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Service => write!(f, "Parameter store service error"),
            FailureKind::Client => write!(f, "Parameter store client error"),
            FailureKind::Other => write!(f, "Unexpected error"),
        }
    }
}

/// Core error types for ssm-inject
#[derive(Error, Debug)]
pub enum Error {
    /// The parameter store returned an error response
    #[error("service error for parameter '{identifier}': {message}")]
    Service { identifier: String, message: String },

    /// The request failed before a service response was received
    #[error("client error for parameter '{identifier}': {message}")]
    Client { identifier: String, message: String },

    /// The parameter exists but carries no value
    #[error("parameter '{identifier}' exists but has no value")]
    MissingValue { identifier: String },

    /// The build host refused a write
    #[error("host rejected {operation}: {message}")]
    Host { operation: String, message: String },

    /// Settings file not found
    #[error("Settings file not found: {path}")]
    ConfigNotFound { path: String },

    /// Settings are syntactically valid but unusable
    #[error("Invalid settings: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a service error
    pub fn service(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Create a client error
    pub fn client(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Client {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Create a missing value error
    pub fn missing_value(identifier: impl Into<String>) -> Self {
        Self::MissingValue {
            identifier: identifier.into(),
        }
    }

    /// Create a host write error
    pub fn host(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Host {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Failure class used for reporting
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Service { .. } => FailureKind::Service,
            Error::Client { .. } => FailureKind::Client,
            _ => FailureKind::Other,
        }
    }
}
