pub mod config;
pub mod error;

pub use config::MixcredConfig;
pub use error::{MixcredError, MixcredResult};
