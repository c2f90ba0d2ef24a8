//! Encoded credential strings
//!
//! Format: `<scheme>$<work_factor>$<output_bits>$<salt>$<hash>`
//!
//! ```text
//! mix4$1000$128$343b3e3d$971885dd143dfcce887d744b6c92f60a
//! ```
//!
//! The scheme tag lets callers tell these strings apart from anything else
//! that may sit in the same column (e.g. placeholder hashes from older
//! account imports).

use std::borrow::Cow;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HashError, ParseError};
use crate::mixing::{absorb, HashParams, OutputBits};
use crate::salt::Salt;

/// Scheme tag written by [`CredentialCodec::default`].
pub const DEFAULT_SCHEME: &str = "mix4";

/// Field delimiter.
pub const DELIMITER: char = '$';

const FIELD_COUNT: usize = 5;

/// The decoded fields of a stored credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedCredential {
    pub scheme: String,
    pub work_factor: u32,
    pub output_bits: OutputBits,
    pub salt: Salt,
    pub hash: String,
}

impl EncodedCredential {
    pub fn params(&self) -> HashParams {
        HashParams {
            work_factor: self.work_factor,
            output_bits: self.output_bits,
        }
    }
}

impl std::fmt::Display for EncodedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}{DELIMITER}{}{DELIMITER}{}",
            self.scheme, self.work_factor, self.output_bits, self.salt, self.hash
        )
    }
}

impl FromStr for EncodedCredential {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CredentialCodec::default().decode(s)
    }
}

/// Encoder/decoder bound to one scheme tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCodec {
    scheme: Cow<'static, str>,
}

impl Default for CredentialCodec {
    fn default() -> Self {
        Self {
            scheme: Cow::Borrowed(DEFAULT_SCHEME),
        }
    }
}

impl CredentialCodec {
    /// Codec for a custom scheme tag.
    ///
    /// The tag must be non-empty and must not contain the delimiter.
    pub fn new(scheme: impl Into<Cow<'static, str>>) -> Result<Self, HashError> {
        let scheme = scheme.into();
        check_field("scheme", &scheme)?;
        Ok(Self { scheme })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Join the five fields into a credential string.
    pub fn encode(
        &self,
        work_factor: u32,
        output_bits: OutputBits,
        salt: &Salt,
        hash: &str,
    ) -> Result<String, HashError> {
        check_field("salt", salt.as_str())?;
        check_field("hash", hash)?;

        Ok(EncodedCredential {
            scheme: self.scheme.to_string(),
            work_factor,
            output_bits,
            salt: salt.clone(),
            hash: hash.to_string(),
        }
        .to_string())
    }

    /// Split a credential string back into its fields.
    pub fn decode(&self, encoded: &str) -> Result<EncodedCredential, ParseError> {
        let fields: Vec<&str> = encoded.split(DELIMITER).collect();
        if fields.len() != FIELD_COUNT {
            return Err(ParseError::FieldCount(fields.len()));
        }
        if let Some(index) = fields.iter().position(|f| f.is_empty()) {
            return Err(ParseError::EmptyField(index));
        }

        let [scheme, work_factor, output_bits, salt, hash] = [
            fields[0], fields[1], fields[2], fields[3], fields[4],
        ];

        if scheme != self.scheme {
            return Err(ParseError::SchemeMismatch {
                expected: self.scheme.to_string(),
                found: scheme.to_string(),
            });
        }

        let work_factor = parse_decimal(work_factor)
            .ok_or_else(|| ParseError::InvalidWorkFactor(work_factor.to_string()))?;
        let output_bits = parse_decimal(output_bits)
            .and_then(|bits| OutputBits::try_from(bits).ok())
            .ok_or_else(|| ParseError::InvalidOutputBits(output_bits.to_string()))?;

        Ok(EncodedCredential {
            scheme: scheme.to_string(),
            work_factor,
            output_bits,
            salt: Salt::supplied(salt),
            hash: hash.to_string(),
        })
    }

    /// Hash `secret` with an explicit salt and encode the result.
    pub fn hash_with_salt(
        &self,
        secret: &str,
        salt: &Salt,
        params: HashParams,
    ) -> Result<String, HashError> {
        check_field("salt", salt.as_str())?;
        let digest = absorb(secret, salt, params.work_factor, params.output_bits)?;
        self.encode(digest.work_factor, digest.output_bits, &digest.salt, &digest.hash)
    }

    /// Hash `secret` under the salt derived from `identifier`.
    pub fn hash(
        &self,
        secret: &str,
        identifier: &str,
        params: HashParams,
    ) -> Result<String, HashError> {
        self.hash_with_salt(secret, &Salt::derive(identifier), params)
    }
}

/// Produce a credential for registration and password changes.
pub fn hash_password(
    secret: &str,
    identifier: &str,
    params: HashParams,
) -> Result<String, HashError> {
    CredentialCodec::default().hash(secret, identifier, params)
}

/// Produce a credential with an explicitly supplied salt.
pub fn hash_password_with_salt(
    secret: &str,
    salt: &Salt,
    params: HashParams,
) -> Result<String, HashError> {
    CredentialCodec::default().hash_with_salt(secret, salt, params)
}

fn check_field(name: &str, value: &str) -> Result<(), HashError> {
    if value.is_empty() {
        return Err(HashError::invalid(format!("{name} must not be empty")));
    }
    if value.contains(DELIMITER) {
        return Err(HashError::invalid(format!(
            "{name} must not contain '{DELIMITER}'"
        )));
    }
    Ok(())
}

/// Plain ASCII decimal only (no sign, no whitespace).
fn parse_decimal(field: &str) -> Option<u32> {
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
