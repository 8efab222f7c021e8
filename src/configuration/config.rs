use super::types::*;
use crate::error_handling::types::ConfigError;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// Option naming a configuration file to load.
pub const CONFIG_FILE_OPTION: &str = "config";

/// Session store connection parameters.
///
/// Every field follows a "first non-empty value wins" rule: once a key holds
/// a value, later assignments from files or host options are ignored. This
/// lets host-supplied options placed before `config` override the file.
///
/// The configuration file is a list of `key = "value"` lines:
///
/// ```text
/// # session store
/// dbhost = "localhost"
/// dbname = "captive"
/// dblogin = "squid"
/// dbpassw = "secret"
/// ```
///
/// `dburl` may be given instead of the four keys above to point at any
/// database the ORM understands (e.g. `sqlite:///var/lib/captive.db?mode=rwc`).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AdapterConfig {
    pub dbhost: String,
    pub dbname: String,
    pub dblogin: String,
    pub dbpassw: String,
    pub dburl: String,
}

impl AdapterConfig {
    /// Applies one host option. `config` loads a file; store keys are
    /// accepted directly; unknown host-standard options are skipped and
    /// anything else is rejected.
    pub fn set_one(&mut self, setting: &Setting) -> Result<(), ConfigError> {
        debug!("setting configuration option {}", setting.name);
        if setting.name == CONFIG_FILE_OPTION {
            return self.load_file(Path::new(&setting.value));
        }
        if let Some(key) = StoreKey::parse(&setting.name) {
            self.assign(key, &setting.value);
            return Ok(());
        }
        if setting.host_standard {
            // host-standard options we do not know or care about
            return Ok(());
        }
        Err(ConfigError::UnsupportedParameter(setting.name.clone()))
    }

    /// Loads `key = "value"` lines from `path`.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        info!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        self.load_str(&content)
    }

    /// Parses configuration text line by line so that repeated keys keep
    /// their first value rather than failing the whole document.
    pub fn load_str(&mut self, content: &str) -> Result<(), ConfigError> {
        for (number, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let table: toml::Table = toml::from_str(line)
                .map_err(|e| ConfigError::TomlError(format!("line {}: {}", number + 1, e)))?;
            for (key, value) in table {
                let Some(store_key) = StoreKey::parse(&key) else {
                    warn!("Ignoring unknown configuration key '{}' on line {}", key, number + 1);
                    continue;
                };
                match value {
                    toml::Value::String(s) => self.assign(store_key, &s),
                    other => {
                        return Err(ConfigError::TomlError(format!(
                            "line {}: value of '{}' must be a string, got {}",
                            number + 1,
                            key,
                            other.type_str()
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    /// Checks that enough parameters are present to reach the store.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dburl.is_empty() {
            return Ok(());
        }
        if self.dbhost.is_empty() {
            return Err(ConfigError::MissingParameter("dbhost".to_string()));
        }
        if self.dbname.is_empty() {
            return Err(ConfigError::MissingParameter("dbname".to_string()));
        }
        Ok(())
    }

    /// Connection URL handed to the ORM.
    pub fn connection_url(&self) -> String {
        if !self.dburl.is_empty() {
            return self.dburl.clone();
        }
        let credentials = match (self.dblogin.is_empty(), self.dbpassw.is_empty()) {
            (true, _) => String::new(),
            (false, true) => format!("{}@", self.dblogin),
            (false, false) => format!("{}:{}@", self.dblogin, self.dbpassw),
        };
        format!("mysql://{}{}/{}", credentials, self.dbhost, self.dbname)
    }

    fn assign(&mut self, key: StoreKey, value: &str) {
        let slot = match key {
            StoreKey::Host => &mut self.dbhost,
            StoreKey::Name => &mut self.dbname,
            StoreKey::Login => &mut self.dblogin,
            StoreKey::Password => &mut self.dbpassw,
            StoreKey::Url => &mut self.dburl,
        };
        if slot.is_empty() {
            slot.push_str(value);
        }
    }
}
