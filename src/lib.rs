pub mod configuration;
pub use configuration::{AdapterConfig, Setting};

pub mod error_handling;

pub mod host;

pub mod message;

pub mod service;
pub use service::{AdapterMode, AdapterService};

pub mod session_management;
pub use session_management::Verdict;

pub mod storage;

pub mod transaction;
pub use transaction::Transaction;
