//! Bounded blocking pool for hash jobs
//!
//! Absorption cost is linear in the work factor and there is no way to
//! interrupt a run. Jobs therefore go to `spawn_blocking`, at most
//! `concurrency` at a time. With a timeout configured the caller stops
//! waiting after the deadline; the abandoned job still runs to completion
//! and keeps its permit until then, so the bound stays honest.

use std::sync::Arc;
use std::time::Duration;

use mixcred_core::config::{MixcredConfig, DEFAULT_MAX_WORK_FACTOR};
use mixcred_core::MixcredResult;
use mixcred_hash::{CredentialCodec, HashParams, Salt, Verification};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Semaphore;

use crate::error::WorkerError;

#[derive(Debug, Clone)]
pub struct HashWorker {
    codec: CredentialCodec,
    params: HashParams,
    semaphore: Arc<Semaphore>,
    timeout: Option<Duration>,
    max_work_factor: u32,
}

impl HashWorker {
    pub fn new(
        codec: CredentialCodec,
        params: HashParams,
        concurrency: usize,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            codec,
            params,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            timeout,
            max_work_factor: DEFAULT_MAX_WORK_FACTOR,
        }
    }

    /// Set the largest stored work factor callers should accept.
    pub fn with_max_work_factor(mut self, max_work_factor: u32) -> Self {
        self.max_work_factor = max_work_factor;
        self
    }

    pub fn max_work_factor(&self) -> u32 {
        self.max_work_factor
    }

    pub fn from_config(config: &MixcredConfig) -> MixcredResult<Self> {
        Ok(Self::new(
            config.hashing.codec()?,
            config.hashing.params()?,
            config.worker.concurrency(),
            config.worker.timeout(),
        )
        .with_max_work_factor(config.hashing.max_work_factor))
    }

    pub fn params(&self) -> HashParams {
        self.params
    }

    pub fn codec(&self) -> &CredentialCodec {
        &self.codec
    }

    /// Produce a credential under the identifier-derived salt.
    pub async fn hash(
        &self,
        secret: SecretString,
        identifier: String,
    ) -> Result<String, WorkerError> {
        let codec = self.codec.clone();
        let params = self.params;
        let encoded = self
            .run(move || codec.hash(secret.expose_secret(), &identifier, params))
            .await??;
        Ok(encoded)
    }

    /// Produce a credential under an explicit salt.
    pub async fn hash_with_salt(
        &self,
        secret: SecretString,
        salt: Salt,
    ) -> Result<String, WorkerError> {
        let codec = self.codec.clone();
        let params = self.params;
        let encoded = self
            .run(move || codec.hash_with_salt(secret.expose_secret(), &salt, params))
            .await??;
        Ok(encoded)
    }

    pub async fn verify(
        &self,
        secret: SecretString,
        encoded: String,
        identifier: Option<String>,
    ) -> Result<Verification, WorkerError> {
        let codec = self.codec.clone();
        self.run(move || codec.verify(secret.expose_secret(), &encoded, identifier.as_deref()))
            .await
    }

    async fn run<T, F>(&self, job: F) -> Result<T, WorkerError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| WorkerError::Closed)?;

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit; // released when the job completes
            job()
        });

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, handle).await.map_err(|_| {
                tracing::warn!(?limit, "hash job timed out; abandoning");
                WorkerError::Timeout(limit)
            })?,
            None => handle.await,
        };

        joined.map_err(|e| WorkerError::Join(e.to_string()))
    }

    /// Stop accepting jobs. In-flight jobs finish normally.
    pub fn close(&self) {
        self.semaphore.close();
    }
}
