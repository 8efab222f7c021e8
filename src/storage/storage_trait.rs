//! Session Store Trait
//!
//! This module defines the `SessionStore` trait, the narrow gateway the
//! adapter uses to reach persisted client sessions.
//!
//! Implementors are responsible for:
//! - Looking up a session by client key
//! - Creating a session on first sighting
//! - Updating the timestamp and counter of an existing session
//!
//! The client key is unique: at most one session exists per key. Timestamps
//! are supplied by the caller so a single transaction uses one clock reading.

use crate::error_handling::types::StorageError;
use crate::storage::types::Session;
use chrono::{DateTime, Utc};

pub trait SessionStore: Send + Sync {
    /// Returns the session of `client_key`, or `None` if the key was never
    /// seen or its stored data is unusable.
    ///
    /// Fails with [`StorageError::ConnectionFailed`] when the store cannot be
    /// reached.
    fn lookup(&self, client_key: &str) -> Result<Option<Session>, StorageError>;

    /// Creates the session of `client_key` with the base counter and
    /// `last_seen = now`, replacing any unusable row under the same key.
    fn insert(&self, client_key: &str, now: DateTime<Utc>) -> Result<(), StorageError>;

    /// Sets `last_seen = now` and the counter of `client_key`.
    fn touch(&self, client_key: &str, counter: i64, now: DateTime<Utc>)
        -> Result<(), StorageError>;
}
