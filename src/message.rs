//! HTTP message model and the captive-portal rewrite applied to it.

pub mod header;
pub mod transform;

pub use header::{Body, Header, Message};
pub use transform::{transform, HeaderEdit, Transform};
