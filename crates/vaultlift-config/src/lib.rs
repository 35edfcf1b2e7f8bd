//! Vaultlift Configuration
//!
//! [`MigrationConfig`] is loaded with precedence
//! defaults < config file < environment < explicit overrides, then
//! validated once. Everything downstream receives the finished value.

pub mod error;
pub mod migration;

pub use error::{ConfigError, ConfigResult};
pub use migration::{
    ConfigOverrides, MigrationConfig, StorageBackend, StorageConfig, DEFAULT_CONCURRENCY_LIMIT,
    DEFAULT_DOCUMENT_WORKERS, DEFAULT_TIMEOUT_SECONDS, TEST_MODE_ENV,
};
