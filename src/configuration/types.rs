/// A single configuration option handed over by the host.
///
/// `host_standard` is set for options the host defines for all adapters;
/// those are skipped silently when the adapter does not know them.
#[derive(Debug, PartialEq, Clone)]
pub struct Setting {
    pub name: String,
    pub value: String,
    pub host_standard: bool,
}

impl Setting {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            host_standard: false,
        }
    }

    pub fn host_standard(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            host_standard: true,
        }
    }
}

/// Keys recognised in the configuration file and as direct options.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum StoreKey {
    Host,
    Name,
    Login,
    Password,
    Url,
}

impl StoreKey {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "dbhost" => Some(StoreKey::Host),
            "dbname" => Some(StoreKey::Name),
            "dblogin" => Some(StoreKey::Login),
            "dbpassw" => Some(StoreKey::Password),
            "dburl" => Some(StoreKey::Url),
            _ => None,
        }
    }
}
