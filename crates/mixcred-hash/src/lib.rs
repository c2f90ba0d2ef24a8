//! mixcred-hash: credential hashing and verification engine
//!
//! Pipeline (registration / password change):
//!
//! ```text
//! identifier → salt::derive_salt → mixing::absorb(salt || secret) → codec::encode
//! ```
//!
//! Login decodes the stored string and runs [`verify`], which tries the
//! identifier-derived salt first and the embedded salt second.
//!
//! Everything here is a pure function of its arguments: no I/O, no shared
//! state, safe to call from any number of threads. Cost grows linearly with
//! the work factor, so async callers should hash on a blocking thread.
//!
//! This is not a password KDF in the Argon2/PBKDF2 sense. It reproduces the
//! credential format the marketplace backend already stores.

pub mod codec;
pub mod error;
pub mod mixing;
pub mod salt;
pub mod verify;

pub use codec::{
    hash_password, hash_password_with_salt, CredentialCodec, EncodedCredential, DEFAULT_SCHEME,
};
pub use error::{HashError, ParseError};
pub use mixing::{
    absorb, hash_with_raw_bits, mix, Digest, HashParams, OutputBits, DEFAULT_WORK_FACTOR,
};
pub use salt::{derive_salt, Salt};
pub use verify::{verify, verify_decoded, Verification};
