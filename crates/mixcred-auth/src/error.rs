use std::time::Duration;

use mixcred_core::MixcredError;
use mixcred_hash::HashError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("hash job timed out after {0:?}")]
    Timeout(Duration),

    #[error("hash worker closed")]
    Closed,

    #[error("hash job failed: {0}")]
    Join(String),

    #[error(transparent)]
    Hash(#[from] HashError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("account already registered: {0}")]
    AlreadyRegistered(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("credential changed concurrently for {0}")]
    CredentialChanged(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

impl From<WorkerError> for MixcredError {
    fn from(e: WorkerError) -> Self {
        match e {
            WorkerError::Timeout(d) => MixcredError::Timeout(d),
            WorkerError::Hash(e) => MixcredError::Hash(e),
            other => MixcredError::Other(anyhow::Error::new(other)),
        }
    }
}
