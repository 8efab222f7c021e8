//! Adaptation transaction subsystem.
//!
//! Re-exports:
//! - [`Transaction`]: per-message state machine driven by the host.
//! - [`BodyStates`], [`OperationState`]: the virgin/adapted body state pair.

pub mod state;
pub mod xaction;

pub use state::{BodyStates, OperationState};
pub use xaction::Transaction;
