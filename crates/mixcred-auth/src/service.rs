//! Register / login / change-password flows
//!
//! Login maps verification outcomes onto what a handler needs to answer:
//!
//! ```text
//! no record / wrong secret      → InvalidCredentials
//! stored value not our format   → NoPassword (placeholder from an import)
//! work factor over the ceiling  → NoPassword (never hashed)
//! Matched                       → Success
//! MatchedNeedsUpgrade           → re-hash under the identifier salt → SuccessUpgraded
//! ```
//!
//! Writes go through [`CredentialStore::replace_if`] keyed on the credential
//! that was verified, so an upgrade or password change never overwrites a
//! credential written in the meantime.
//!
//! Hashing runs on the [`HashWorker`]; no store lock is held across it.

use mixcred_hash::Verification;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::error::{AuthError, StoreError};
use crate::store::{normalize_identifier, CredentialStore, UserRecord};
use crate::worker::HashWorker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    /// Succeeded, and the stored credential was rewritten under the current
    /// salt strategy.
    SuccessUpgraded,
    InvalidCredentials,
    /// The account exists but has no credential in a recognized format.
    NoPassword,
}

impl LoginOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::SuccessUpgraded)
    }
}

pub struct Authenticator<S> {
    store: S,
    worker: HashWorker,
}

impl<S: CredentialStore> Authenticator<S> {
    pub fn new(store: S, worker: HashWorker) -> Self {
        Self { store, worker }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn worker(&self) -> &HashWorker {
        &self.worker
    }

    /// Create an account credential. Fails if the identifier is taken.
    pub async fn register(&self, identifier: &str, secret: &SecretString) -> Result<(), AuthError> {
        let key = normalize_identifier(identifier);
        if self.store.load(&key).await?.is_some() {
            return Err(AuthError::AlreadyRegistered(key));
        }

        let credential = self.worker.hash(duplicate(secret), key.clone()).await?;
        self.store
            .insert(UserRecord::new(key.clone(), credential))
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists(k) => AuthError::AlreadyRegistered(k),
                other => AuthError::Store(other),
            })?;

        info!(identifier = %key, "registered credential");
        Ok(())
    }

    pub async fn login(
        &self,
        identifier: &str,
        secret: &SecretString,
    ) -> Result<LoginOutcome, AuthError> {
        let key = normalize_identifier(identifier);
        let (record, outcome) = match self.check(&key, secret).await? {
            Checked::Verified(record, outcome) => (record, outcome),
            Checked::Missing => return Ok(LoginOutcome::InvalidCredentials),
            Checked::Unusable => return Ok(LoginOutcome::NoPassword),
        };

        match outcome {
            Verification::Matched => Ok(LoginOutcome::Success),
            Verification::Unmatched => Ok(LoginOutcome::InvalidCredentials),
            Verification::MatchedNeedsUpgrade => {
                let fresh = self.worker.hash(duplicate(secret), key.clone()).await?;
                let written = self
                    .store
                    .replace_if(&record.credential, UserRecord::new(key.clone(), fresh))
                    .await;
                match written {
                    Ok(true) => {
                        info!(identifier = %key, "upgraded legacy credential");
                        Ok(LoginOutcome::SuccessUpgraded)
                    }
                    Ok(false) => {
                        // Replaced since it was verified (e.g. a password change); keep theirs.
                        debug!(identifier = %key, "credential changed before upgrade; skipped");
                        Ok(LoginOutcome::Success)
                    }
                    Err(e) => {
                        // The secret was correct; a failed rewrite must not block the login.
                        warn!(identifier = %key, error = %e, "credential upgrade not saved");
                        Ok(LoginOutcome::Success)
                    }
                }
            }
        }
    }

    /// Replace the credential after checking the current secret.
    ///
    /// Fails with [`AuthError::CredentialChanged`] if the stored credential
    /// was replaced between the check and the write.
    pub async fn change_password(
        &self,
        identifier: &str,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), AuthError> {
        let key = normalize_identifier(identifier);
        let record = match self.check(&key, current).await? {
            Checked::Verified(record, outcome) if outcome.is_match() => record,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let credential = self.worker.hash(duplicate(new), key.clone()).await?;
        let written = self
            .store
            .replace_if(&record.credential, UserRecord::new(key.clone(), credential))
            .await?;
        if !written {
            return Err(AuthError::CredentialChanged(key));
        }

        info!(identifier = %key, "password changed");
        Ok(())
    }

    /// Load the record for `key` and verify `secret` against it.
    async fn check(&self, key: &str, secret: &SecretString) -> Result<Checked, AuthError> {
        let Some(record) = self.store.load(key).await? else {
            debug!(identifier = %key, "no account");
            return Ok(Checked::Missing);
        };

        let cred = match self.worker.codec().decode(&record.credential) {
            Ok(cred) => cred,
            Err(e) => {
                warn!(identifier = %key, error = %e, "stored credential is not in a recognized format");
                return Ok(Checked::Unusable);
            }
        };
        if cred.work_factor > self.worker.max_work_factor() {
            warn!(
                identifier = %key,
                work_factor = cred.work_factor,
                max = self.worker.max_work_factor(),
                "stored work factor over limit; not verifying"
            );
            return Ok(Checked::Unusable);
        }

        let outcome = self
            .worker
            .verify(duplicate(secret), record.credential.clone(), Some(key.to_string()))
            .await?;
        Ok(Checked::Verified(record, outcome))
    }
}

enum Checked {
    Missing,
    /// Not our format, or parameters we refuse to run.
    Unusable,
    Verified(UserRecord, Verification),
}

/// Worker jobs need an owned secret.
fn duplicate(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}
