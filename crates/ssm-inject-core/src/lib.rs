//! # ssm-inject-core
//!
//! Core library for ssm-inject providing:
//! - Settings loading (ssm-inject.yaml)
//! - The shared error type and failure classification
//! - Secret hygiene: zeroizing strings and output masking

pub mod config;
pub mod error;
pub mod security;
pub mod types;

pub use config::Settings;
pub use error::{Error, FailureKind, Result};
pub use security::{OutputMasker, SecureString};
pub use types::{ParameterMap, ResolvedSecret};
