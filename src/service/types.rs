use crate::session_management::SessionManager;

/// Behaviour of the transactions a service creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterMode {
    /// Admission check and status page for every message.
    Captivating,
    /// Pass-through: every message is used as is, bodies are never touched.
    Minimal,
}

/// Lifecycle position of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Accepting configuration, not yet started.
    Idle,
    Started,
    Stopped,
    /// No further start will happen.
    Retired,
}

/// Read-only state shared by all transactions of a started service.
pub struct SharedService {
    pub mode: AdapterMode,
    /// URI of the host, reported in the marker header.
    pub host_uri: String,
    /// Admission round trip; absent in minimal mode.
    pub admission: Option<SessionManager>,
}
