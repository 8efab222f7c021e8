use crate::session_management::clock::Clock;
use crate::error_handling::types::StorageError;
use crate::session_management::policy::{decide, usable};
use crate::session_management::Verdict;
use crate::storage::SessionStore;
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use std::sync::Arc;

/// Result of one admission round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub verdict: Verdict,
    /// Counter computed for this transaction.
    pub counter: i64,
    /// Whether the client had no usable session and one was inserted.
    pub new_session: bool,
    pub decided_at: DateTime<Utc>,
}

/// The structure related to session admission
///
/// Wraps the session store round trip performed at the start of every
/// transaction: look up the client, decide, insert a session on first
/// sighting and always record the new counter and timestamp.
///
/// Store failures never abort a transaction. An unreachable store or a
/// failed write is logged and the decision falls back to the "new client"
/// path, which blocks. Once the store reports it cannot be reached, no
/// further store calls are made for that admission.
///
/// # Fields Overview
///
/// - `store`: shared session store handle
/// - `clock`: time source for `last_seen` comparisons and updates
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn admit(&self, client_key: &str) -> Admission {
        let now = self.clock.now();

        let (session, mut reachable) = match self.store.lookup(client_key) {
            Ok(session) => (session, true),
            Err(e) => {
                error!("Failed to get session of {}: {}", client_key, e);
                warn!("Treating {} as a new client", client_key);
                (None, !matches!(e, StorageError::ConnectionFailed))
            }
        };
        let session = session.filter(|s| {
            let ok = usable(s);
            if !ok {
                warn!(
                    "Session of {} has an unusable counter {}, starting over",
                    client_key, s.sequence_counter
                );
            }
            ok
        });

        let (verdict, counter) = decide(session.as_ref(), now);
        let new_session = session.is_none();

        if new_session && reachable {
            if let Err(e) = self.store.insert(client_key, now) {
                error!("Failed to insert session of {}: {}", client_key, e);
                reachable = !matches!(e, StorageError::ConnectionFailed);
            }
        }
        if reachable {
            if let Err(e) = self.store.touch(client_key, counter, now) {
                error!("Failed to update session of {}: {}", client_key, e);
            }
        } else {
            debug!("Session store unreachable, skipping updates for {}", client_key);
        }

        debug!(
            "Admission for {}: {:?} (counter {}, new session: {})",
            client_key, verdict, counter, new_session
        );
        Admission {
            verdict,
            counter,
            new_session,
            decided_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_management::clock::ManualClock;
    use crate::storage::types::BASE_COUNTER;
    use crate::storage::{MemorySessionStore, Session};
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup() -> (SessionManager, Arc<MemorySessionStore>, Arc<ManualClock>) {
        let store = Arc::new(MemorySessionStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        ));
        let manager = SessionManager::new(store.clone(), clock.clone());
        (manager, store, clock)
    }

    #[test]
    fn test_first_sighting_inserts_and_blocks() {
        let (manager, store, clock) = setup();
        let admission = manager.admit("10.0.0.5");
        assert_eq!(admission.verdict, Verdict::Blocked);
        assert!(admission.new_session);
        let session = store.get("10.0.0.5").unwrap();
        assert_eq!(session.sequence_counter, BASE_COUNTER);
        assert_eq!(session.last_seen, clock.now());
    }

    #[test]
    fn test_renewals_alternate_within_window() {
        let (manager, store, clock) = setup();
        manager.admit("10.0.0.5");
        clock.advance(Duration::seconds(10));
        let second = manager.admit("10.0.0.5");
        assert_eq!((second.verdict, second.counter), (Verdict::Blocked, 1));
        clock.advance(Duration::seconds(10));
        let third = manager.admit("10.0.0.5");
        assert_eq!((third.verdict, third.counter), (Verdict::Allowed, 2));
        assert_eq!(store.get("10.0.0.5").unwrap().sequence_counter, 2);
    }

    #[test]
    fn test_expired_session_is_touched_without_advancing() {
        let (manager, store, clock) = setup();
        manager.admit("10.0.0.5");
        clock.advance(Duration::hours(2));
        let admission = manager.admit("10.0.0.5");
        assert_eq!((admission.verdict, admission.counter), (Verdict::Allowed, 0));
        assert_eq!(store.get("10.0.0.5").unwrap().last_seen, clock.now());
    }

    #[test]
    fn test_repeated_touch_keeps_captured_verdict() {
        let (manager, store, clock) = setup();
        manager.admit("10.0.0.5");
        clock.advance(Duration::seconds(10));
        let admission = manager.admit("10.0.0.5");
        store
            .touch("10.0.0.5", admission.counter, clock.now())
            .unwrap();
        store
            .touch("10.0.0.5", admission.counter, clock.now())
            .unwrap();
        assert_eq!(admission.verdict, Verdict::Blocked);
        assert_eq!(
            store.get("10.0.0.5").unwrap().sequence_counter,
            admission.counter
        );
    }

    #[test]
    fn test_unavailable_store_falls_back_to_blocked() {
        let (manager, store, _clock) = setup();
        store.set_available(false);
        let admission = manager.admit("10.0.0.5");
        assert_eq!(admission.verdict, Verdict::Blocked);
        assert!(admission.new_session);
        assert!(store.is_empty());
    }

    /// Store that counts calls and fails them, except for a lookup that may
    /// be set to find nothing.
    struct CountingStore {
        calls: AtomicUsize,
        error: fn() -> StorageError,
        lookup_finds_nothing: bool,
    }

    impl CountingStore {
        fn failing_with(error: fn() -> StorageError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                error,
                lookup_finds_nothing: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn fail<T>(&self) -> Result<T, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err((self.error)())
        }
    }

    impl SessionStore for CountingStore {
        fn lookup(&self, _: &str) -> Result<Option<Session>, StorageError> {
            if self.lookup_finds_nothing {
                self.calls.fetch_add(1, Ordering::SeqCst);
                return Ok(None);
            }
            self.fail()
        }

        fn insert(&self, _: &str, _: DateTime<Utc>) -> Result<(), StorageError> {
            self.fail()
        }

        fn touch(&self, _: &str, _: i64, _: DateTime<Utc>) -> Result<(), StorageError> {
            self.fail()
        }
    }

    fn manager_over(store: Arc<CountingStore>) -> SessionManager {
        SessionManager::new(store, Arc::new(ManualClock::new(Utc::now())))
    }

    #[test]
    fn test_unreachable_store_is_asked_once() {
        let store = Arc::new(CountingStore::failing_with(|| StorageError::ConnectionFailed));
        let admission = manager_over(store.clone()).admit("10.0.0.5");
        assert_eq!(admission.verdict, Verdict::Blocked);
        assert_eq!(store.calls(), 1);
    }

    #[test]
    fn test_failed_read_still_attempts_writes() {
        let store = Arc::new(CountingStore::failing_with(|| StorageError::ReadFailed));
        let admission = manager_over(store.clone()).admit("10.0.0.5");
        assert_eq!(admission.verdict, Verdict::Blocked);
        assert_eq!(store.calls(), 3);
    }

    #[test]
    fn test_connection_lost_on_insert_skips_touch() {
        let mut store = CountingStore::failing_with(|| StorageError::ConnectionFailed);
        store.lookup_finds_nothing = true;
        let store = Arc::new(store);
        let admission = manager_over(store.clone()).admit("10.0.0.5");
        assert_eq!(admission.verdict, Verdict::Blocked);
        // lookup and insert, no touch
        assert_eq!(store.calls(), 2);
    }

    #[test]
    fn test_saturated_counter_starts_over() {
        let (manager, store, clock) = setup();
        store.insert("10.0.0.5", clock.now()).unwrap();
        store.touch("10.0.0.5", i64::MAX, clock.now()).unwrap();
        clock.advance(Duration::seconds(10));

        let admission = manager.admit("10.0.0.5");
        assert_eq!(admission.verdict, Verdict::Blocked);
        assert_eq!(admission.counter, BASE_COUNTER);
        assert!(admission.new_session);
        assert_eq!(store.get("10.0.0.5").unwrap().sequence_counter, BASE_COUNTER);
    }

    #[test]
    fn test_clients_are_independent() {
        let (manager, _store, clock) = setup();
        manager.admit("10.0.0.5");
        clock.advance(Duration::seconds(1));
        manager.admit("10.0.0.5");
        let other = manager.admit("10.0.0.6");
        assert!(other.new_session);
        assert_eq!(other.counter, BASE_COUNTER);
    }
}
