//! The 4-byte mixing core
//!
//! A small ARX-style state machine: the byte stream `salt || secret` is
//! absorbed four bytes at a time for `work_factor` passes, then the state is
//! expanded into the requested digest length.
//!
//! Characters enter the stream as UTF-16 code units truncated to their low
//! byte (not UTF-8 encoded). This matches credentials produced by the
//! existing web backend and must not change.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::HashError;
use crate::salt::Salt;

/// Initial value of the mixing state.
pub const INITIAL_STATE: [u8; 4] = [0x6A, 0x89, 0xFE, 0x32];

/// Default number of absorption passes.
pub const DEFAULT_WORK_FACTOR: u32 = 1000;

/// Supported digest sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum OutputBits {
    B64,
    #[default]
    B128,
    B256,
}

impl OutputBits {
    pub const fn bits(self) -> u32 {
        match self {
            Self::B64 => 64,
            Self::B128 => 128,
            Self::B256 => 256,
        }
    }

    /// Digest length in bytes.
    pub const fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    /// Digest length in hex characters.
    pub const fn hex_len(self) -> usize {
        self.bits() as usize / 4
    }
}

impl TryFrom<u32> for OutputBits {
    type Error = HashError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            64 => Ok(Self::B64),
            128 => Ok(Self::B128),
            256 => Ok(Self::B256),
            other => Err(HashError::invalid(format!(
                "output bits must be 64, 128 or 256, got {other}"
            ))),
        }
    }
}

impl From<OutputBits> for u32 {
    fn from(bits: OutputBits) -> Self {
        bits.bits()
    }
}

impl std::fmt::Display for OutputBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Work factor and digest size for one hash run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashParams {
    pub work_factor: u32,
    pub output_bits: OutputBits,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            work_factor: DEFAULT_WORK_FACTOR,
            output_bits: OutputBits::default(),
        }
    }
}

/// Result of one absorption run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// Lowercase hex digest, `output_bits / 4` characters.
    pub hash: String,
    pub salt: Salt,
    pub work_factor: u32,
    pub output_bits: OutputBits,
}

/// The mixing primitive. Lanes update in order; each uses the lane updated
/// just before it.
#[inline]
pub fn mix([a, b, c, d]: [u8; 4]) -> [u8; 4] {
    let a = a.wrapping_add(b) ^ d.rotate_right(3);
    let b = b.wrapping_add(c) ^ a.rotate_right(5);
    let c = c.wrapping_add(d) ^ b.rotate_right(1);
    let d = d.wrapping_add(a) ^ c.rotate_right(2);
    [a, b, c, d]
}

/// Absorb `salt || secret` into the mixing state and expand a digest.
///
/// `work_factor == 0` is legal and expands the initial state directly.
/// An empty salt is rejected: callers must derive or supply one.
pub fn absorb(
    secret: &str,
    salt: &Salt,
    work_factor: u32,
    output_bits: OutputBits,
) -> Result<Digest, HashError> {
    if salt.is_empty() {
        return Err(HashError::invalid("salt is required"));
    }

    let units: Zeroizing<Vec<u16>> = Zeroizing::new(
        salt.as_str()
            .encode_utf16()
            .chain(secret.encode_utf16())
            .collect(),
    );
    let bytes: Zeroizing<Vec<u8>> = Zeroizing::new(units.iter().map(|u| *u as u8).collect());

    let mut state = INITIAL_STATE;
    for _ in 0..work_factor {
        state = absorb_pass(state, &bytes, &units);
    }

    Ok(Digest {
        hash: expand(state, output_bits),
        salt: salt.clone(),
        work_factor,
        output_bits,
    })
}

/// Like [`absorb`], but validates an untyped bit count first.
pub fn hash_with_raw_bits(
    secret: &str,
    salt: &Salt,
    work_factor: u32,
    output_bits: u32,
) -> Result<Digest, HashError> {
    absorb(secret, salt, work_factor, OutputBits::try_from(output_bits)?)
}

/// One full pass over the byte stream, followed by a diffusion mix.
fn absorb_pass(mut state: [u8; 4], bytes: &[u8], units: &[u16]) -> [u8; 4] {
    for (index, chunk) in bytes.chunks(4).enumerate() {
        let mut block = [0u8; 4];
        block[..chunk.len()].copy_from_slice(chunk);

        let mixed = mix([
            state[0] ^ block[0],
            state[1] ^ block[1],
            state[2] ^ block[2],
            state[3] ^ block[3],
        ]);

        // units is non-empty whenever bytes is (same length)
        let shift = units[index % units.len()] as u8;
        for (lane, m) in state.iter_mut().zip(mixed) {
            *lane = lane.wrapping_add(m).wrapping_add(shift);
        }
    }
    mix(state)
}

/// Squeeze `output_bits / 8` bytes from the state, re-mixing every 4 bytes.
fn expand(mut state: [u8; 4], output_bits: OutputBits) -> String {
    let mut out = String::with_capacity(output_bits.hex_len());
    for i in 0..output_bits.bytes() {
        out.push_str(&format!("{:02x}", state[i % 4]));
        if i % 4 == 3 {
            state = mix(state);
        }
    }
    out
}
