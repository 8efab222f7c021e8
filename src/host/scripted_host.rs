//! In-process host double.
//!
//! `ScriptedHost` plays the host side of one transaction: it serves a fixed
//! virgin message and metadata, holds virgin body bytes fed by the caller and
//! records every call the adapter makes. Clones share the same state, so a
//! caller keeps one clone to feed and inspect while the transaction owns
//! another.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use super::host_transaction::{HostTransaction, META_CLIENT_IP};
use crate::message::Message;

/// A call made by the adapter into the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    UseVirgin,
    UseAdapted,
    AdaptationAborted,
    VbMake,
    VbMakeMore,
    VbStopMaking,
    VbContent,
    VbContentShift(usize),
    NoteAbContentAvailable,
    NoteAbContentDone(bool),
}

#[derive(Debug, Default)]
struct HostState {
    calls: Vec<HostCall>,
    adapted: Option<Message>,
    virgin_pending: Vec<u8>,
    virgin_consumed: usize,
}

#[derive(Debug, Clone)]
pub struct ScriptedHost {
    virgin: Message,
    options: HashMap<String, String>,
    state: Rc<RefCell<HostState>>,
}

impl ScriptedHost {
    pub fn new(virgin: Message) -> Self {
        Self {
            virgin,
            options: HashMap::new(),
            state: Rc::new(RefCell::new(HostState::default())),
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn with_client_ip(self, ip: impl Into<String>) -> Self {
        self.with_option(META_CLIENT_IP, ip)
    }

    /// Makes `bytes` available as virgin body content.
    pub fn feed(&self, bytes: &[u8]) {
        self.state.borrow_mut().virgin_pending.extend_from_slice(bytes);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, call: &HostCall) -> usize {
        self.state.borrow().calls.iter().filter(|c| *c == call).count()
    }

    pub fn adapted(&self) -> Option<Message> {
        self.state.borrow().adapted.clone()
    }

    /// Virgin bytes still held by the host.
    pub fn virgin_pending(&self) -> usize {
        self.state.borrow().virgin_pending.len()
    }

    /// Virgin bytes released by the adapter so far.
    pub fn virgin_consumed(&self) -> usize {
        self.state.borrow().virgin_consumed
    }

    fn record(&self, call: HostCall) {
        trace!("host call: {:?}", call);
        self.state.borrow_mut().calls.push(call);
    }
}

impl HostTransaction for ScriptedHost {
    fn virgin(&self) -> &Message {
        &self.virgin
    }

    fn option(&self, name: &str) -> Option<String> {
        self.options.get(name).cloned()
    }

    fn use_virgin(&mut self) {
        self.record(HostCall::UseVirgin);
    }

    fn use_adapted(&mut self, message: Message) {
        self.record(HostCall::UseAdapted);
        self.state.borrow_mut().adapted = Some(message);
    }

    fn adaptation_aborted(&mut self) {
        self.record(HostCall::AdaptationAborted);
    }

    fn vb_make(&mut self) {
        self.record(HostCall::VbMake);
    }

    fn vb_make_more(&mut self) {
        self.record(HostCall::VbMakeMore);
    }

    fn vb_stop_making(&mut self) {
        self.record(HostCall::VbStopMaking);
    }

    fn vb_content(&mut self, offset: usize, size: usize) -> Vec<u8> {
        self.record(HostCall::VbContent);
        let state = self.state.borrow();
        let start = offset.min(state.virgin_pending.len());
        let end = start.saturating_add(size).min(state.virgin_pending.len());
        state.virgin_pending[start..end].to_vec()
    }

    fn vb_content_shift(&mut self, size: usize) {
        self.record(HostCall::VbContentShift(size));
        let mut state = self.state.borrow_mut();
        let size = size.min(state.virgin_pending.len());
        state.virgin_pending.drain(..size);
        state.virgin_consumed += size;
    }

    fn note_ab_content_available(&mut self) {
        self.record(HostCall::NoteAbContentAvailable);
    }

    fn note_ab_content_done(&mut self, at_end: bool) {
        self.record(HostCall::NoteAbContentDone(at_end));
    }
}
