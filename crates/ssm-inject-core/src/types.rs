//! Core types shared by the resolver and its hosts

use crate::security::SecureString;
use std::collections::HashMap;

/// Parameter name to parameter value, as handed over by a build host
pub type ParameterMap = HashMap<String, String>;

/// A parameter whose placeholder was replaced by the value fetched from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// Original parameter key, category marker included
    pub key: String,
    /// Plaintext value from the parameter store
    pub value: SecureString,
}

impl ResolvedSecret {
    pub fn new(key: impl Into<String>, value: SecureString) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_secret_debug_redacts_value() {
        let secret = ResolvedSecret::new("env.DB_PASS", SecureString::from("p@ss"));
        let debug_str = format!("{:?}", secret);

        assert!(debug_str.contains("env.DB_PASS"));
        assert!(!debug_str.contains("p@ss"));
    }
}
