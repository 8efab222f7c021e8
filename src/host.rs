//! Host side of the adaptation protocol.
//!
//! - [`HostTransaction`]: callbacks the adapter uses to talk to its host.
//! - [`ScriptedHost`]: in-process host that records calls, used by the probe
//!   binary and the test suites.

pub mod host_transaction;
pub mod scripted_host;

pub use host_transaction::{HostTransaction, META_CLIENT_IP};
pub use scripted_host::{HostCall, ScriptedHost};
