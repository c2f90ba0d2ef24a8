//! End-to-end checks of the produce / verify contract.
//!
//! These go through the public API only, the way the account flows use it.

use mixcred_hash::{
    derive_salt, hash_password, hash_password_with_salt, verify, CredentialCodec, HashParams,
    OutputBits, Salt, Verification,
};

const ID: &str = "user@bscse.uiu.ac.bd";

/// Registration with the default parameters reproduces a fixed credential.
#[test]
fn registration_credential_is_stable() {
    assert_eq!(derive_salt(ID), "343b3e3d");
    for _ in 0..3 {
        assert_eq!(derive_salt(ID), "343b3e3d");
    }

    let encoded = hash_password("newpassword123", ID, HashParams::default()).unwrap();
    assert_eq!(
        encoded,
        "mix4$1000$128$343b3e3d$971885dd143dfcce887d744b6c92f60a"
    );

    assert_eq!(
        verify("newpassword123", &encoded, Some(ID)),
        Verification::Matched
    );
}

/// A credential written with a pre-identifier salt verifies once, flags an
/// upgrade, and the re-hashed replacement verifies cleanly.
#[test]
fn legacy_credential_upgrade_cycle() {
    let params = HashParams::default();
    let legacy =
        hash_password_with_salt("newpassword123", &Salt::supplied("legacy-salt"), params).unwrap();
    assert_eq!(
        legacy,
        "mix4$1000$128$legacy-salt$2f47dce94b79796a89bebcdcdc9cd60d"
    );

    let outcome = verify("newpassword123", &legacy, Some(ID));
    assert_eq!(outcome, Verification::MatchedNeedsUpgrade);

    // Caller re-hashes under the current strategy and stores the result
    let stored = CredentialCodec::default().decode(&legacy).unwrap();
    let upgraded = hash_password("newpassword123", ID, stored.params()).unwrap();
    assert_eq!(
        verify("newpassword123", &upgraded, Some(ID)),
        Verification::Matched
    );
}

/// Parameters stored in the credential, not the caller's defaults, drive
/// verification.
#[test]
fn verification_uses_stored_parameters() {
    for bits in [OutputBits::B64, OutputBits::B128, OutputBits::B256] {
        for work_factor in [0, 1, 3, 50] {
            let params = HashParams { work_factor, output_bits: bits };
            let encoded = hash_password("s3cret!", ID, params).unwrap();
            let digest = encoded.rsplit('$').next().unwrap();
            assert_eq!(digest.len(), bits.hex_len());
            assert_eq!(verify("s3cret!", &encoded, Some(ID)), Verification::Matched);
        }
    }
}

/// Empty, unicode, and very long secrets are all accepted.
#[test]
fn unusual_secrets_accepted() {
    let params = HashParams { work_factor: 4, output_bits: OutputBits::B128 };
    let long = "x".repeat(4096);
    for secret in ["", "pässwörd", "密码🔑", long.as_str()] {
        let encoded = hash_password(secret, ID, params).unwrap();
        assert_eq!(verify(secret, &encoded, Some(ID)), Verification::Matched);
    }
}

/// Foreign or corrupted values degrade to "no match", never to a panic.
#[test]
fn foreign_values_unmatched() {
    let placeholder = "$2b$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";
    assert_eq!(verify("password", placeholder, Some(ID)), Verification::Unmatched);
    assert_eq!(
        verify("password", "not-a-valid-format", Some(ID)),
        Verification::Unmatched
    );
    assert_eq!(verify("password", "", None), Verification::Unmatched);
}

/// Verification is stateless, so concurrent callers see identical results.
#[test]
fn concurrent_verification() {
    let encoded =
        hash_password("newpassword123", ID, HashParams { work_factor: 32, ..Default::default() })
            .unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let encoded = encoded.as_str();
                scope.spawn(move || {
                    let secret = if i % 2 == 0 { "newpassword123" } else { "wrong" };
                    (i, verify(secret, encoded, Some(ID)))
                })
            })
            .collect();

        for handle in handles {
            let (i, outcome) = handle.join().unwrap();
            let expected = if i % 2 == 0 {
                Verification::Matched
            } else {
                Verification::Unmatched
            };
            assert_eq!(outcome, expected);
        }
    });
}
