//! Host Transaction Trait
//!
//! The interface a proxy host exposes to one adapter transaction. The host
//! owns the original ("virgin") message and body and receives the adapted
//! message back.
//!
//! Calls into the host are only made from inside a host call into the
//! adapter transaction, never spontaneously.

use crate::message::Message;

/// Metadata option carrying the client network address.
pub const META_CLIENT_IP: &str = "client-ip";

pub trait HostTransaction {
    /// The original message.
    fn virgin(&self) -> &Message;

    /// Host metadata such as [`META_CLIENT_IP`].
    fn option(&self, name: &str) -> Option<String>;

    /// Tells the host to forward the original message unchanged.
    fn use_virgin(&mut self);

    /// Hands over the adapted message.
    fn use_adapted(&mut self, message: Message);

    /// The adapter gave up before completing the transaction.
    fn adaptation_aborted(&mut self);

    /// Asks the host to start supplying the virgin body.
    fn vb_make(&mut self);

    /// Asks the host for more virgin body bytes.
    fn vb_make_more(&mut self);

    /// The adapter no longer needs the virgin body.
    fn vb_stop_making(&mut self);

    /// Copies up to `size` available virgin bytes starting at `offset`.
    fn vb_content(&mut self, offset: usize, size: usize) -> Vec<u8>;

    /// Releases the first `size` available virgin bytes.
    fn vb_content_shift(&mut self, size: usize);

    fn note_ab_content_available(&mut self);

    fn note_ab_content_done(&mut self, at_end: bool);
}
