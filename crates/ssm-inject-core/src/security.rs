//! Secret hygiene
//!
//! Provides:
//! - SecureString with zeroize
//! - OutputMasker, the log filter that redacts registered values

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Replacement written in place of a masked value
pub const MASK: &str = "*******";

/// A secure string that is automatically zeroed on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    /// Create a new secure string
    pub fn new(value: String) -> Self {
        Self { inner: value }
    }

    /// Get the string value (use with caution)
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to owned String (consumes self)
    pub fn into_string(mut self) -> String {
        std::mem::take(&mut self.inner)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString([REDACTED {} bytes])", self.len())
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Redacts registered plaintext values from output text.
///
/// Values are replaced longest first so that a secret which contains another
/// registered secret is masked as a whole.
#[derive(Default)]
pub struct OutputMasker {
    passwords: Vec<SecureString>,
}

impl OutputMasker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value that must never appear in output.
    ///
    /// Empty values are ignored, duplicates are registered once.
    pub fn add_password(&mut self, value: &str) {
        if value.is_empty() || self.passwords.iter().any(|p| p.as_str() == value) {
            return;
        }
        self.passwords.push(SecureString::from(value));
        self.passwords.sort_by_key(|p| std::cmp::Reverse(p.len()));
    }

    /// Return `text` with every registered value replaced by [`MASK`]
    pub fn mask(&self, text: &str) -> String {
        let mut masked = text.to_string();
        for password in &self.passwords {
            if masked.contains(password.as_str()) {
                masked = masked.replace(password.as_str(), MASK);
            }
        }
        masked
    }

    pub fn len(&self) -> usize {
        self.passwords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passwords.is_empty()
    }
}

impl fmt::Debug for OutputMasker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputMasker({} values)", self.passwords.len())
    }
}
