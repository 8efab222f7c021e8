//! Error types shared by the configuration, storage and service layers.
//!
//! Host/adapter contract violations are not represented here: they panic.

pub mod types;

pub use types::{ConfigError, ServiceError, StorageError};
