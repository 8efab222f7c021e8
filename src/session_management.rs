//! Session admission core module.
//!
//! This module decides, per transaction, whether a client may pass the
//! captive portal. The decision itself is a pure function (`policy`); the
//! `session_manager` performs the store round trip around it.

use serde::{Deserialize, Serialize};

/// Submodule providing the time source used by admission.
pub mod clock;
/// Submodule holding the pure admission decision.
pub mod policy;
/// Submodule for the store round trip around the decision.
pub mod session_manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use policy::{decide, usable, SESSION_TIMEOUT};
pub use session_manager::{Admission, SessionManager};

/// Outcome of admission for one transaction.
///
/// Variants:
/// - `Allowed`: the client passed the portal; a "Success" page is served.
/// - `Blocked`: the client is held at the portal; a "Blocked" page is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Allowed,
    Blocked,
}

impl Verdict {
    /// Verdict carried by a renewal counter: even counters pass.
    pub fn from_counter(counter: i64) -> Self {
        if counter % 2 == 0 {
            Verdict::Allowed
        } else {
            Verdict::Blocked
        }
    }
}
