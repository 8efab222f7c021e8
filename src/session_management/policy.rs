use chrono::{DateTime, Duration, Utc};

use super::Verdict;
use crate::storage::types::{Session, BASE_COUNTER};

/// Renewal window: a session seen within this span advances its counter.
pub const SESSION_TIMEOUT: Duration = Duration::hours(1);

/// Maps the previous session of a client to a verdict and the counter the
/// caller must store.
///
/// - no session: `Blocked`, base counter (the caller inserts a session);
/// - seen less than [`SESSION_TIMEOUT`] ago: counter + 1;
/// - otherwise: counter unchanged.
///
/// Outside the first case the verdict is the parity of the new counter. A
/// counter that cannot advance is handled like a missing session.
pub fn decide(session: Option<&Session>, now: DateTime<Utc>) -> (Verdict, i64) {
    let Some(session) = session else {
        return (Verdict::Blocked, BASE_COUNTER);
    };
    let counter = if now - session.last_seen < SESSION_TIMEOUT {
        match session.sequence_counter.checked_add(1) {
            Some(counter) => counter,
            None => return (Verdict::Blocked, BASE_COUNTER),
        }
    } else {
        session.sequence_counter
    };
    (Verdict::from_counter(counter), counter)
}

/// Whether a stored session can take part in a decision. Counters below the
/// base value or at the top of the range come from a corrupted row.
pub fn usable(session: &Session) -> bool {
    (BASE_COUNTER..i64::MAX).contains(&session.sequence_counter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(counter: i64, last_seen: DateTime<Utc>) -> Session {
        Session {
            client_key: "10.0.0.5".into(),
            last_seen,
            sequence_counter: counter,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_unknown_client_is_blocked() {
        assert_eq!(decide(None, t0()), (Verdict::Blocked, BASE_COUNTER));
    }

    #[test]
    fn test_within_window_advances_and_alternates() {
        let mut last = session(0, t0());
        let mut verdicts = Vec::new();
        for step in 1..=4 {
            let now = t0() + Duration::seconds(10 * step);
            let (verdict, counter) = decide(Some(&last), now);
            assert_eq!(counter, last.sequence_counter + 1);
            verdicts.push(verdict);
            last = session(counter, now);
        }
        assert_eq!(
            verdicts,
            vec![
                Verdict::Blocked,
                Verdict::Allowed,
                Verdict::Blocked,
                Verdict::Allowed
            ]
        );
    }

    #[test]
    fn test_expired_keeps_counter() {
        for counter in [0, 1, 2, 7] {
            let prev = session(counter, t0());
            let (verdict, next) = decide(Some(&prev), t0() + SESSION_TIMEOUT);
            assert_eq!(next, counter);
            assert_eq!(verdict, Verdict::from_counter(counter));

            let (_, next) = decide(Some(&prev), t0() + Duration::days(3));
            assert_eq!(next, counter);
        }
    }

    #[test]
    fn test_window_boundary() {
        let prev = session(2, t0());
        let just_inside = t0() + SESSION_TIMEOUT - Duration::seconds(1);
        assert_eq!(decide(Some(&prev), just_inside), (Verdict::Blocked, 3));
        assert_eq!(decide(Some(&prev), t0() + SESSION_TIMEOUT), (Verdict::Allowed, 2));
    }

    #[test]
    fn test_decide_is_deterministic() {
        let prev = session(5, t0());
        let now = t0() + Duration::minutes(5);
        assert_eq!(decide(Some(&prev), now), decide(Some(&prev), now));
    }

    #[test]
    fn test_saturated_counter_does_not_overflow() {
        let prev = session(i64::MAX, t0());
        let now = t0() + Duration::seconds(10);
        assert_eq!(decide(Some(&prev), now), (Verdict::Blocked, BASE_COUNTER));
        assert!(!usable(&prev));
    }

    #[test]
    fn test_usable_counters() {
        assert!(usable(&session(BASE_COUNTER, t0())));
        assert!(usable(&session(41, t0())));
        assert!(!usable(&session(-1, t0())));
        assert!(!usable(&session(i64::MAX, t0())));
    }
}
