//! mixcred-auth: account flows on top of the credential engine
//!
//! - `store`: user-record persistence interface (+ in-memory implementation)
//! - `worker`: runs hash/verify jobs on blocking threads, bounded and
//!   optionally timed out, so async handlers never hash on the executor
//! - `service`: register, login (with rehash-on-upgrade), change password

pub mod error;
pub mod service;
pub mod store;
pub mod worker;

pub use error::{AuthError, StoreError, WorkerError};
pub use service::{Authenticator, LoginOutcome};
pub use store::{normalize_identifier, CredentialStore, MemoryStore, UserRecord};
pub use worker::HashWorker;
