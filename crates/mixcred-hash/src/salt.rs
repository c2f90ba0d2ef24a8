//! Salt derivation from account identifiers
//!
//! The current salt strategy derives a short hex salt from the account's
//! email-like identifier with a polynomial rolling hash. The result is fully
//! reproducible, so the salt never needs to be stored separately from the
//! identifier. Legacy credentials carry arbitrary supplied salts instead.

use serde::{Deserialize, Serialize};

/// Modulus for the rolling hash.
pub const SALT_MODULUS: u64 = 1_000_000_007;

/// Multiplier for the rolling hash.
const SALT_MULTIPLIER: u64 = 33;

/// Salt returned for empty (or whitespace-only) identifiers.
pub const EMPTY_IDENTIFIER_SALT: &str = "0";

/// A salt string mixed ahead of the secret before absorption.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Salt(String);

impl Salt {
    /// Derive the salt for an identifier (current strategy).
    pub fn derive(identifier: &str) -> Self {
        Self(derive_salt(identifier))
    }

    /// Wrap an externally supplied salt (legacy strategy).
    ///
    /// No validation happens here; an empty salt is rejected at hash time.
    pub fn supplied(salt: impl Into<String>) -> Self {
        Self(salt.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Salt {
    fn from(s: &str) -> Self {
        Self::supplied(s)
    }
}

/// Derive a lowercase hex salt from an identifier.
///
/// The identifier is trimmed and lowercased, then folded one code point at a
/// time: `acc = (acc * 33 + cp) mod 1_000_000_007`, starting from zero.
pub fn derive_salt(identifier: &str) -> String {
    let normalized = identifier.trim().to_lowercase();
    if normalized.is_empty() {
        return EMPTY_IDENTIFIER_SALT.to_string();
    }

    let acc = normalized.chars().fold(0u64, |acc, ch| {
        (acc * SALT_MULTIPLIER + u64::from(u32::from(ch))) % SALT_MODULUS
    });

    format!("{acc:x}")
}
