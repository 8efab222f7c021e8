//! Adapter side of one adaptation transaction.
//!
//! A [`Transaction`] is created by the service for every message the host
//! routes through the adapter. The host then drives it through `start`, the
//! adapted-body calls (`ab_*`), the virgin-body notifications (`note_vb_*`)
//! and finally `stop`. Admission runs synchronously inside `start`; the
//! resulting status page is kept in the transaction buffer and served through
//! `ab_content` / `ab_content_shift`.
//!
//! Calls that break the protocol (for example `ab_make` twice) are contract
//! violations and panic: they mean host and adapter disagree about the state
//! of the exchange, which cannot be repaired mid-stream.

use std::sync::Arc;

use log::{debug, error, info, trace, warn};
use uuid::Uuid;

use super::state::{BodyStates, OperationState};
use crate::host::{HostTransaction, META_CLIENT_IP};
use crate::message::transform::transform;
use crate::service::{AdapterMode, SharedService};
use crate::session_management::{Admission, Verdict};

#[track_caller]
fn contract_violation(id: &Uuid, what: &str) -> ! {
    error!("[{}] contract violation: {}", id, what);
    panic!("contract violation: {}", what);
}

pub struct Transaction {
    id: Uuid,
    service: Arc<SharedService>,
    /// Present until `stop` or the last host call.
    host: Option<Box<dyn HostTransaction>>,
    states: BodyStates,
    started: bool,
    /// Adapted content not yet shifted out by the host.
    buffer: Vec<u8>,
    /// `at_end` reported with the end of the virgin body.
    vb_at_end: bool,
    client_key: Option<String>,
    admission: Option<Admission>,
    verdict: Option<Verdict>,
    virgin_bytes: usize,
}

impl Transaction {
    pub fn new(service: Arc<SharedService>, host: Box<dyn HostTransaction>) -> Self {
        let id = Uuid::new_v4();
        debug!("[{}] transaction created", id);
        Self {
            id,
            service,
            host: Some(host),
            states: BodyStates::default(),
            started: false,
            buffer: Vec::new(),
            vb_at_end: true,
            client_key: None,
            admission: None,
            verdict: None,
            virgin_bytes: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn states(&self) -> BodyStates {
        self.states
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    pub fn admission(&self) -> Option<&Admission> {
        self.admission.as_ref()
    }

    pub fn client_key(&self) -> Option<&str> {
        self.client_key.as_deref()
    }

    /// Virgin body bytes drained from the host so far.
    pub fn virgin_bytes(&self) -> usize {
        self.virgin_bytes
    }

    /// Whether the host may still call into this transaction.
    pub fn callable(&self) -> bool {
        self.host.is_some()
    }

    /// Transaction meta-information; this adapter has none.
    pub fn option(&self, _name: &str) -> Option<String> {
        None
    }

    pub fn visit_each_option<F: FnMut(&str, &str)>(&self, _visitor: F) {}

    pub fn start(&mut self) {
        info!("[{}] start", self.id);
        if self.started {
            contract_violation(&self.id, "start called twice");
        }
        self.started = true;
        match self.service.mode {
            AdapterMode::Captivating => self.start_captivating(),
            AdapterMode::Minimal => self.start_minimal(),
        }
    }

    fn start_minimal(&mut self) {
        let mut host = self.last_host_call();
        self.client_key = host.option(META_CLIENT_IP);
        host.use_virgin();
    }

    fn start_captivating(&mut self) {
        if self.host().virgin().has_body() {
            self.states.vb = OperationState::Active;
            self.host().vb_make();
        } else {
            // not interested in a virgin body that does not exist
            self.states.vb = OperationState::Never;
        }

        let verdict = self.admit();
        self.verdict = Some(verdict);

        let edits = transform(verdict, &self.service.host_uri);
        let mut adapted = self.host().virgin().clone();
        edits.apply(&mut adapted.header);
        self.buffer = edits.body;

        if adapted.has_body() {
            self.host().use_adapted(adapted);
        } else {
            // nothing to send
            self.states.ab = OperationState::Never;
            self.last_host_call().use_adapted(adapted);
        }
        debug!("[{}] started with {:?}, {}", self.id, verdict, self.states);
    }

    fn admit(&mut self) -> Verdict {
        let client_key = self.host().option(META_CLIENT_IP).filter(|ip| !ip.is_empty());
        let Some(client_key) = client_key else {
            warn!("[{}] host supplied no client address, blocking", self.id);
            return Verdict::Blocked;
        };
        let Some(admission) = self.service.admission.as_ref().map(|m| m.admit(&client_key)) else {
            warn!("[{}] no session store configured, blocking", self.id);
            self.client_key = Some(client_key);
            return Verdict::Blocked;
        };
        info!(
            "[{}] client {} is {:?} (counter {})",
            self.id, client_key, admission.verdict, admission.counter
        );
        let verdict = admission.verdict;
        self.client_key = Some(client_key);
        self.admission = Some(admission);
        verdict
    }

    /// The host is done calling into this transaction.
    pub fn stop(&mut self) {
        debug!("[{}] stop", self.id);
        self.host = None;
    }

    pub fn ab_discard(&mut self) {
        self.require_body_support();
        trace!("[{}] ab_discard ({})", self.id, self.states);
        if self.states.ab != OperationState::Undecided {
            contract_violation(&self.id, "ab_discard after the adapted body was decided");
        }
        self.states.ab = OperationState::Never;
        // no more vb needed if the host is not interested in ab
        self.stop_vb();
    }

    pub fn ab_make(&mut self) {
        self.require_body_support();
        trace!("[{}] ab_make ({})", self.id, self.states);
        if self.states.ab != OperationState::Undecided {
            contract_violation(&self.id, "ab_make after the adapted body was decided");
        }
        if !self.host().virgin().has_body() {
            contract_violation(&self.id, "ab_make without a virgin body");
        }
        if !self.states.vb_started() {
            contract_violation(&self.id, "ab_make while the virgin body is not being received");
        }

        self.states.ab = OperationState::Active;
        if !self.buffer.is_empty() {
            self.host().note_ab_content_available();
        }
        if self.states.vb == OperationState::Complete {
            // the virgin side already ended; nothing else will close ab
            self.states.ab = OperationState::Complete;
            let at_end = self.vb_at_end;
            self.host().note_ab_content_done(at_end);
        }
    }

    pub fn ab_make_more(&mut self) {
        self.require_body_support();
        trace!("[{}] ab_make_more ({})", self.id, self.states);
        if self.states.vb != OperationState::Active {
            contract_violation(&self.id, "ab_make_more while the virgin body is not active");
        }
        self.host().vb_make_more();
    }

    pub fn ab_stop_making(&mut self) {
        self.require_body_support();
        trace!("[{}] ab_stop_making ({})", self.id, self.states);
        // a discarded body stays discarded
        if self.states.ab != OperationState::Never {
            self.states.ab = OperationState::Complete;
        }
        // no more vb needed if the host is not interested in more ab
        self.stop_vb();
    }

    /// Up to `size` bytes of adapted content starting at `offset`.
    pub fn ab_content(&self, offset: usize, size: usize) -> &[u8] {
        self.require_body_support();
        if !self.states.ab_sending() {
            contract_violation(&self.id, "ab_content while the adapted body is not being sent");
        }
        let start = offset.min(self.buffer.len());
        let end = start.saturating_add(size).min(self.buffer.len());
        &self.buffer[start..end]
    }

    /// The host consumed the first `size` bytes of adapted content.
    pub fn ab_content_shift(&mut self, size: usize) {
        self.require_body_support();
        if !self.states.ab_sending() {
            contract_violation(
                &self.id,
                "ab_content_shift while the adapted body is not being sent",
            );
        }
        let size = size.min(self.buffer.len());
        self.buffer.drain(..size);
        trace!("[{}] shifted {} bytes, {} left", self.id, size, self.buffer.len());
    }

    pub fn note_vb_content_done(&mut self, at_end: bool) {
        self.require_body_support();
        debug!("[{}] virgin body done (at_end: {})", self.id, at_end);
        if self.states.vb != OperationState::Active {
            contract_violation(&self.id, "note_vb_content_done while the virgin body is not active");
        }
        self.states.vb = OperationState::Complete;
        self.vb_at_end = at_end;
        if self.states.ab == OperationState::Active {
            self.host().note_ab_content_done(at_end);
            self.states.ab = OperationState::Complete;
        }
    }

    pub fn note_vb_content_available(&mut self) {
        self.require_body_support();
        if self.states.vb != OperationState::Active {
            contract_violation(
                &self.id,
                "note_vb_content_available while the virgin body is not active",
            );
        }

        let host = self.host();
        let chunk = host.vb_content(0, usize::MAX);
        // we have a copy; the host may let go of those bytes
        host.vb_content_shift(chunk.len());
        self.virgin_bytes += chunk.len();
        trace!("[{}] drained {} virgin bytes", self.id, chunk.len());

        if self.states.ab == OperationState::Active {
            self.host().note_ab_content_available();
        }
    }

    /// Tells the host that we are not interested in [more] virgin body, if
    /// the host does not know that already.
    fn stop_vb(&mut self) {
        match self.states.vb {
            OperationState::Active => {
                self.host().vb_stop_making();
                self.states.vb = OperationState::Complete;
            }
            OperationState::Undecided => {
                contract_violation(&self.id, "virgin body state still undecided")
            }
            // already got the entire body or refused it earlier
            OperationState::Complete | OperationState::Never => {}
        }
    }

    fn require_body_support(&self) {
        if self.service.mode == AdapterMode::Minimal {
            contract_violation(&self.id, "minimal adapter offers no body support");
        }
    }

    fn host(&mut self) -> &mut dyn HostTransaction {
        match self.host.as_deref_mut() {
            Some(host) => host,
            None => contract_violation(&self.id, "no host transaction to call"),
        }
    }

    /// Releases the host reference for a final call; nothing may call the
    /// host through this transaction afterwards.
    fn last_host_call(&mut self) -> Box<dyn HostTransaction> {
        match self.host.take() {
            Some(host) => host,
            None => contract_violation(&self.id, "no host transaction to call"),
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Some(mut host) = self.host.take() {
            warn!("[{}] destroyed before stop, aborting adaptation", self.id);
            host.adaptation_aborted();
        }
    }
}
