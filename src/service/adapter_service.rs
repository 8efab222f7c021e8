use log::{debug, info, warn};
use std::sync::Arc;

use crate::configuration::config::AdapterConfig;
use crate::configuration::types::Setting;
use crate::error_handling::types::ServiceError;
use crate::host::HostTransaction;
use crate::service::types::{AdapterMode, ServiceState, SharedService};
use crate::session_management::{Clock, SessionManager, SystemClock};
use crate::storage::{DatabaseSessionStore, SessionStore};
use crate::transaction::Transaction;

pub const CAPTIVATING_URI: &str = "ecap://murka.cz/james/captivating";
pub const MINIMAL_URI: &str = "ecap://e-cap.org/ecap/services/sample/minimal";

/// Per-process adapter service.
///
/// Holds the configuration and the session store handle shared by every
/// transaction, and creates transactions while started.
///
/// Lifecycle:
/// - `configure` once with the host options (fails on unknown options);
/// - `start` opens the window for `make_transaction`;
/// - `stop` closes it until the next `start`;
/// - `retire` closes it for good.
///
/// Transactions already created keep their own reference to the shared state
/// and finish normally after `stop` or `retire`.
pub struct AdapterService {
    mode: AdapterMode,
    host_uri: String,
    config: AdapterConfig,
    configured: bool,
    state: ServiceState,
    store: Option<Arc<dyn SessionStore>>,
    clock: Arc<dyn Clock>,
    shared: Option<Arc<SharedService>>,
}

impl AdapterService {
    pub fn new(mode: AdapterMode, host_uri: impl Into<String>) -> Self {
        Self {
            mode,
            host_uri: host_uri.into(),
            config: AdapterConfig::default(),
            configured: false,
            state: ServiceState::Idle,
            store: None,
            clock: Arc::new(SystemClock),
            shared: None,
        }
    }

    /// Uses `store` instead of opening a database from the configuration.
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Unique across all vendors.
    pub fn uri(&self) -> &'static str {
        match self.mode {
            AdapterMode::Captivating => CAPTIVATING_URI,
            AdapterMode::Minimal => MINIMAL_URI,
        }
    }

    /// Changes with version.
    pub fn tag(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn describe(&self) -> String {
        let kind = match self.mode {
            AdapterMode::Captivating => "captivating",
            AdapterMode::Minimal => "minimal",
        };
        format!(
            "A {} adapter from {} v{}",
            kind,
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )
    }

    /// Every message is adapted.
    pub fn wants_url(&self, _url: &str) -> bool {
        true
    }

    pub fn mode(&self) -> AdapterMode {
        self.mode
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn configure(&mut self, settings: &[Setting]) -> Result<(), ServiceError> {
        info!("Configuring {}", self.uri());
        // nothing is kept unless every setting applies
        let mut config = self.config.clone();
        for setting in settings {
            config.set_one(setting)?;
        }
        if self.mode == AdapterMode::Captivating && self.store.is_none() {
            config.validate()?;
        }
        self.config = config;
        self.configured = true;
        info!("Configuration imported successfully");
        Ok(())
    }

    /// This service is not reconfigurable; the current settings stay.
    pub fn reconfigure(&mut self, settings: &[Setting]) -> Result<(), ServiceError> {
        warn!(
            "Ignoring reconfiguration with {} option(s), keeping current settings",
            settings.len()
        );
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), ServiceError> {
        match self.state {
            ServiceState::Retired => return Err(ServiceError::Retired),
            ServiceState::Started => {
                debug!("Service already started");
                return Ok(());
            }
            ServiceState::Idle | ServiceState::Stopped => {}
        }
        if !self.configured {
            return Err(ServiceError::NotConfigured);
        }
        if self.shared.is_none() {
            self.shared = Some(Arc::new(self.build_shared()?));
        }
        self.state = ServiceState::Started;
        info!("Service {} started", self.uri());
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.state == ServiceState::Started {
            self.state = ServiceState::Stopped;
        }
        info!("Service {} stopped", self.uri());
    }

    pub fn retire(&mut self) {
        self.state = ServiceState::Retired;
        self.shared = None;
        info!("Service {} retired", self.uri());
    }

    pub fn is_running(&self) -> bool {
        self.state == ServiceState::Started
    }

    pub fn make_transaction(
        &self,
        host: Box<dyn HostTransaction>,
    ) -> Result<Transaction, ServiceError> {
        match (self.state, self.shared.as_ref()) {
            (ServiceState::Started, Some(shared)) => Ok(Transaction::new(shared.clone(), host)),
            (ServiceState::Retired, _) => Err(ServiceError::Retired),
            _ => Err(ServiceError::NotRunning),
        }
    }

    fn build_shared(&mut self) -> Result<SharedService, ServiceError> {
        let admission = match self.mode {
            AdapterMode::Minimal => None,
            AdapterMode::Captivating => {
                let store = match self.store.clone() {
                    Some(store) => store,
                    None => {
                        let store: Arc<dyn SessionStore> =
                            Arc::new(DatabaseSessionStore::new(self.config.connection_url())?);
                        self.store = Some(store.clone());
                        store
                    }
                };
                Some(SessionManager::new(store, self.clock.clone()))
            }
        };
        Ok(SharedService {
            mode: self.mode,
            host_uri: self.host_uri.clone(),
            admission,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::types::ConfigError;
    use crate::host::ScriptedHost;
    use crate::message::Message;
    use crate::storage::MemorySessionStore;

    fn memory_service() -> AdapterService {
        AdapterService::new(AdapterMode::Captivating, "ecap://host.test")
            .with_store(Arc::new(MemorySessionStore::new()))
    }

    fn host() -> Box<dyn HostTransaction> {
        Box::new(ScriptedHost::new(Message::default()))
    }

    #[test]
    fn test_description() {
        let service = memory_service();
        assert_eq!(service.uri(), CAPTIVATING_URI);
        assert_eq!(service.tag(), env!("CARGO_PKG_VERSION"));
        assert!(service.describe().starts_with("A captivating adapter from captivate v"));
        assert!(service.wants_url("http://example.com/"));
        let minimal = AdapterService::new(AdapterMode::Minimal, "h");
        assert_eq!(minimal.uri(), MINIMAL_URI);
    }

    #[test]
    fn test_transactions_only_while_started() {
        let mut service = memory_service();
        assert!(matches!(
            service.make_transaction(host()),
            Err(ServiceError::NotRunning)
        ));
        assert!(matches!(service.start(), Err(ServiceError::NotConfigured)));

        service.configure(&[]).unwrap();
        service.start().unwrap();
        assert!(service.is_running());
        assert!(service.make_transaction(host()).is_ok());

        service.stop();
        assert!(matches!(
            service.make_transaction(host()),
            Err(ServiceError::NotRunning)
        ));

        service.start().unwrap();
        assert!(service.make_transaction(host()).is_ok());

        service.retire();
        assert!(matches!(
            service.make_transaction(host()),
            Err(ServiceError::Retired)
        ));
        assert!(matches!(service.start(), Err(ServiceError::Retired)));
    }

    #[test]
    fn test_unknown_option_fails_configuration() {
        let mut service = memory_service();
        let err = service
            .configure(&[Setting::new("victim", "foo")])
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Configuration(ConfigError::UnsupportedParameter(_))
        ));
        assert!(matches!(service.start(), Err(ServiceError::NotConfigured)));
    }

    #[test]
    fn test_failed_configuration_applies_nothing() {
        let mut service = memory_service();
        assert!(service
            .configure(&[
                Setting::new("dbhost", "typo.local"),
                Setting::new("victim", "foo"),
            ])
            .is_err());
        assert_eq!(service.config(), &AdapterConfig::default());

        service
            .configure(&[Setting::new("dbhost", "db.local")])
            .unwrap();
        assert_eq!(service.config().dbhost, "db.local");
    }

    #[test]
    fn test_failed_validation_applies_nothing() {
        let mut service = AdapterService::new(AdapterMode::Captivating, "h");
        assert!(service
            .configure(&[Setting::new("dblogin", "squid")])
            .is_err());
        assert!(service.config().dblogin.is_empty());
    }

    #[test]
    fn test_database_mode_requires_store_parameters() {
        let mut service = AdapterService::new(AdapterMode::Captivating, "h");
        assert!(matches!(
            service.configure(&[Setting::host_standard("message-size-limit", "1")]),
            Err(ServiceError::Configuration(ConfigError::MissingParameter(_)))
        ));

        let mut service = AdapterService::new(AdapterMode::Captivating, "h");
        service
            .configure(&[
                Setting::new("dbhost", "db.local"),
                Setting::new("dbname", "captive"),
            ])
            .unwrap();
        assert_eq!(service.config().connection_url(), "mysql://db.local/captive");
        // connecting is deferred to the first transaction
        service.start().unwrap();
    }

    #[test]
    fn test_reconfigure_keeps_settings() {
        let mut service = memory_service();
        service
            .configure(&[Setting::new("dbhost", "first")])
            .unwrap();
        service
            .reconfigure(&[Setting::new("dbhost", "second")])
            .unwrap();
        assert_eq!(service.config().dbhost, "first");
    }

    #[test]
    fn test_minimal_service_needs_no_store() {
        let mut service = AdapterService::new(AdapterMode::Minimal, "h");
        service.configure(&[]).unwrap();
        service.start().unwrap();
        assert!(service.make_transaction(host()).is_ok());
    }
}
