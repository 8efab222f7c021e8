//! Storage subsystem
//!
//! This module provides the session store gateway used by admission.
//!
//! Components:
//! - `storage_trait`: the `SessionStore` trait (lookup / insert / touch).
//! - `types`: the persisted `Session` record.
//! - `database_storage`: ORM-based implementation using SeaORM (MySQL or SQLite).
//! - `memory_storage`: in-process implementation for dry runs and tests.
//! - `db_entities`: SeaORM entity model of the `clients` table.

pub mod database_storage;
pub mod db_entities;
pub mod memory_storage;
pub mod storage_trait;
pub mod types;

pub use database_storage::DatabaseSessionStore;
pub use memory_storage::MemorySessionStore;
pub use storage_trait::SessionStore;
pub use types::Session;
