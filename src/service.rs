//! Adapter service subsystem.
//!
//! The service is the per-process entry point the host talks to: it is
//! configured once, started and stopped, and creates one [`Transaction`]
//! per adapted message while started.
//!
//! Example:
//! ```no_run
//! use captivate::configuration::Setting;
//! use captivate::host::ScriptedHost;
//! use captivate::message::Message;
//! use captivate::service::{AdapterMode, AdapterService};
//!
//! let mut service = AdapterService::new(AdapterMode::Captivating, "ecap://host.example");
//! service.configure(&[Setting::new("config", "/etc/squid/captive.conf")])?;
//! service.start()?;
//!
//! let host = ScriptedHost::new(Message::default()).with_client_ip("10.0.0.5");
//! let mut xaction = service.make_transaction(Box::new(host))?;
//! xaction.start();
//! xaction.stop();
//! # Ok::<(), captivate::error_handling::ServiceError>(())
//! ```
//!
//! [`Transaction`]: crate::transaction::Transaction

pub mod adapter_service;
pub mod types;

pub use adapter_service::AdapterService;
pub use types::{AdapterMode, ServiceState, SharedService};
