use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::{debug, error};

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::SessionStore;
use crate::storage::types::{Session, BASE_COUNTER};

/// In-process session store.
///
/// Used for dry runs and tests. `set_available(false)` makes every call fail
/// with [`StorageError::ConnectionFailed`], as an unreachable database would.
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    available: AtomicBool,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Current session of `client_key`, bypassing availability.
    pub fn get(&self, client_key: &str) -> Option<Session> {
        self.sessions
            .lock()
            .ok()
            .and_then(|sessions| sessions.get(client_key).cloned())
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sessions(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Session>>, StorageError> {
        if !self.available.load(Ordering::SeqCst) {
            error!("Memory session store is unavailable");
            return Err(StorageError::ConnectionFailed);
        }
        self.sessions
            .lock()
            .map_err(|_| StorageError::ConnectionFailed)
    }
}

impl SessionStore for MemorySessionStore {
    fn lookup(&self, client_key: &str) -> Result<Option<Session>, StorageError> {
        Ok(self.sessions()?.get(client_key).cloned())
    }

    fn insert(&self, client_key: &str, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.sessions()?.insert(
            client_key.to_owned(),
            Session {
                client_key: client_key.to_owned(),
                last_seen: now,
                sequence_counter: BASE_COUNTER,
            },
        );
        debug!("Inserted session for {}", client_key);
        Ok(())
    }

    fn touch(
        &self,
        client_key: &str,
        counter: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if let Some(session) = self.sessions()?.get_mut(client_key) {
            session.last_seen = now;
            session.sequence_counter = counter;
        }
        Ok(())
    }
}
