//! User-record store interface
//!
//! The engine only produces and checks credential strings; persisting them is
//! the store's job. Real deployments back this with the relational user
//! table. [`MemoryStore`] serves tests and the CLI.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::StoreError;

/// The persisted part of an account, as far as credentials are concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub identifier: String,
    /// Encoded credential, or whatever placeholder an older import left.
    pub credential: String,
}

impl UserRecord {
    pub fn new(identifier: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            credential: credential.into(),
        }
    }
}

/// Persistence for user credentials. Identifiers are matched after
/// [`normalize_identifier`].
pub trait CredentialStore: Send + Sync {
    fn load(
        &self,
        identifier: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    /// Insert a new record; fails with [`StoreError::AlreadyExists`].
    fn insert(&self, record: UserRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Insert or replace.
    fn save(&self, record: UserRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replace the record only while its credential still equals `expected`.
    ///
    /// Returns `false` (and writes nothing) when the record is missing or
    /// holds another credential. Check and write must be atomic.
    fn replace_if(
        &self,
        expected: &str,
        record: UserRecord,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// Lookup key for an identifier (same normalization as salt derivation).
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// In-memory store, cheap to clone (shared map).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl CredentialStore for MemoryStore {
    async fn load(&self, identifier: &str) -> Result<Option<UserRecord>, StoreError> {
        let key = normalize_identifier(identifier);
        Ok(self.records.read().await.get(&key).cloned())
    }

    async fn insert(&self, record: UserRecord) -> Result<(), StoreError> {
        let key = normalize_identifier(&record.identifier);
        let mut records = self.records.write().await;
        if records.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }
        records.insert(key, record);
        Ok(())
    }

    async fn save(&self, record: UserRecord) -> Result<(), StoreError> {
        let key = normalize_identifier(&record.identifier);
        self.records.write().await.insert(key, record);
        Ok(())
    }

    async fn replace_if(&self, expected: &str, record: UserRecord) -> Result<bool, StoreError> {
        let key = normalize_identifier(&record.identifier);
        let mut records = self.records.write().await;
        match records.get_mut(&key) {
            Some(current) if current.credential == expected => {
                *current = record;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
