pub mod config;
pub mod types;

pub use config::AdapterConfig;
pub use types::Setting;
