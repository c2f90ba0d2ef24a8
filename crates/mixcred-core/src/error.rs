use thiserror::Error;

pub type MixcredResult<T> = Result<T, MixcredError>;

#[derive(Debug, Error)]
pub enum MixcredError {
    #[error("hash error: {0}")]
    Hash(#[from] mixcred_hash::HashError),

    #[error("credential parse error: {0}")]
    Parse(#[from] mixcred_hash::ParseError),

    #[error("config error: {0}")]
    Config(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
