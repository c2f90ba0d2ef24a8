//! Dual-path credential verification
//!
//! Stored credentials come from two salt histories:
//!
//! - current: salt derived from the account identifier ([`Salt::derive`])
//! - legacy: whatever salt was embedded in the credential when it was written
//!
//! Verification tries the current strategy first and falls back to the
//! embedded salt. A legacy match tells the caller to re-hash and store a fresh
//! credential. Nothing here returns an error: malformed or foreign strings
//! are simply `Unmatched`.

use subtle::ConstantTimeEq;

use crate::codec::{CredentialCodec, EncodedCredential};
use crate::mixing::absorb;
use crate::salt::Salt;

/// Outcome of checking a secret against a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Matched under the identifier-derived salt.
    Matched,
    /// Matched under the embedded (legacy) salt; re-hash and store.
    MatchedNeedsUpgrade,
    Unmatched,
}

impl Verification {
    pub fn is_match(self) -> bool {
        !matches!(self, Self::Unmatched)
    }

    pub fn needs_upgrade(self) -> bool {
        matches!(self, Self::MatchedNeedsUpgrade)
    }
}

/// Verify `secret` against a credential in the default scheme.
pub fn verify(secret: &str, encoded: &str, identifier: Option<&str>) -> Verification {
    CredentialCodec::default().verify(secret, encoded, identifier)
}

impl CredentialCodec {
    /// Verify `secret` against a credential in this codec's scheme.
    pub fn verify(&self, secret: &str, encoded: &str, identifier: Option<&str>) -> Verification {
        match self.decode(encoded) {
            Ok(cred) => verify_decoded(secret, &cred, identifier),
            Err(e) => {
                tracing::debug!(error = %e, "stored credential not in {} format", self.scheme());
                Verification::Unmatched
            }
        }
    }
}

/// Verify `secret` against already-decoded fields.
pub fn verify_decoded(
    secret: &str,
    cred: &EncodedCredential,
    identifier: Option<&str>,
) -> Verification {
    if let Some(identifier) = identifier {
        let current = Salt::derive(identifier);
        if digest_matches(secret, &current, cred) {
            tracing::debug!(work_factor = cred.work_factor, "credential matched");
            return Verification::Matched;
        }
        if current == cred.salt {
            // Legacy attempt would recompute the same digest.
            return Verification::Unmatched;
        }
    }

    if digest_matches(secret, &cred.salt, cred) {
        tracing::debug!(
            work_factor = cred.work_factor,
            "credential matched under embedded salt; upgrade required"
        );
        return Verification::MatchedNeedsUpgrade;
    }

    Verification::Unmatched
}

fn digest_matches(secret: &str, salt: &Salt, cred: &EncodedCredential) -> bool {
    match absorb(secret, salt, cred.work_factor, cred.output_bits) {
        Ok(digest) => bool::from(digest.hash.as_bytes().ct_eq(cred.hash.as_bytes())),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{hash_password, hash_password_with_salt};
    use crate::mixing::{HashParams, OutputBits};

    const ID: &str = "user@bscse.uiu.ac.bd";

    fn fast() -> HashParams {
        HashParams {
            work_factor: 16,
            output_bits: OutputBits::B128,
        }
    }

    #[test]
    fn test_current_strategy_match() {
        let encoded = hash_password("newpassword123", ID, fast()).unwrap();
        assert_eq!(
            verify("newpassword123", &encoded, Some(ID)),
            Verification::Matched
        );
    }

    #[test]
    fn test_identifier_is_normalized() {
        let encoded = hash_password("pw", ID, fast()).unwrap();
        assert_eq!(
            verify("pw", &encoded, Some("  User@BSCSE.uiu.ac.bd ")),
            Verification::Matched
        );
    }

    #[test]
    fn test_legacy_salt_needs_upgrade() {
        let encoded =
            hash_password_with_salt("newpassword123", &Salt::supplied("legacy-salt"), fast())
                .unwrap();
        let outcome = verify("newpassword123", &encoded, Some(ID));
        assert_eq!(outcome, Verification::MatchedNeedsUpgrade);
        assert!(outcome.is_match());
        assert!(outcome.needs_upgrade());
    }

    #[test]
    fn test_without_identifier_falls_back_to_embedded_salt() {
        let encoded = hash_password("pw", ID, fast()).unwrap();
        assert_eq!(verify("pw", &encoded, None), Verification::MatchedNeedsUpgrade);
    }

    #[test]
    fn test_wrong_secret() {
        let encoded = hash_password("newpassword123", ID, fast()).unwrap();
        let outcome = verify("newpassword124", &encoded, Some(ID));
        assert_eq!(outcome, Verification::Unmatched);
        assert!(!outcome.is_match());
        assert!(!outcome.needs_upgrade());

        let legacy =
            hash_password_with_salt("newpassword123", &Salt::supplied("abcd"), fast()).unwrap();
        assert_eq!(verify("nope", &legacy, Some(ID)), Verification::Unmatched);
    }

    #[test]
    fn test_wrong_identifier_still_checks_embedded_salt() {
        // Salt embedded is derived from ID, but the caller passes another
        // identifier: only the embedded salt can match.
        let encoded = hash_password("pw", ID, fast()).unwrap();
        assert_eq!(
            verify("pw", &encoded, Some("other@bscse.uiu.ac.bd")),
            Verification::MatchedNeedsUpgrade
        );
    }

    #[test]
    fn test_malformed_input_unmatched() {
        for stored in [
            "not-a-valid-format",
            "",
            "$$$$",
            "bcrypt$10$128$abc$def",
            "mix4$x$128$abc$def",
            "mix4$10$100$abc$def",
            "mix4$10$128$abc$def$ghi",
        ] {
            assert_eq!(
                verify("anything", stored, Some(ID)),
                Verification::Unmatched,
                "{stored:?} must not match"
            );
        }
    }

    #[test]
    fn test_tampered_digest_unmatched() {
        let encoded = hash_password("pw", ID, fast()).unwrap();
        let (head, last) = encoded.split_at(encoded.len() - 1);
        let tampered = format!("{head}{}", if last == "0" { "1" } else { "0" });
        assert_eq!(verify("pw", &tampered, Some(ID)), Verification::Unmatched);
    }

    #[test]
    fn test_custom_scheme_verify() {
        let codec = CredentialCodec::new("campus").unwrap();
        let encoded = codec.hash("pw", ID, fast()).unwrap();
        assert_eq!(codec.verify("pw", &encoded, Some(ID)), Verification::Matched);
        assert_eq!(verify("pw", &encoded, Some(ID)), Verification::Unmatched);
    }
}
