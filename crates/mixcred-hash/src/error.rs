use thiserror::Error;

/// Errors raised while producing a credential.
///
/// These indicate a caller bug (bad parameters), never a wrong password.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl HashError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// Errors raised while decoding a stored credential string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected 5 '$'-separated fields, found {0}")]
    FieldCount(usize),

    #[error("field {0} is empty")]
    EmptyField(usize),

    #[error("scheme mismatch: expected {expected:?}, found {found:?}")]
    SchemeMismatch { expected: String, found: String },

    #[error("invalid work factor: {0:?}")]
    InvalidWorkFactor(String),

    #[error("invalid output bits: {0:?}")]
    InvalidOutputBits(String),
}
