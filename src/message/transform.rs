//! Header rewriting and status page synthesis.
//!
//! Every adapted message carries a replacement HTML page, so the header set
//! is rewritten to match: the length becomes unknown, compression is not
//! negotiated, the content is declared as HTML and a `214` warning records
//! the transformation.

use crate::message::header::Header;
use crate::session_management::Verdict;

/// Marker header naming the host that ran the adaptation.
pub const MARKER_HEADER: &str = "X-Ecap";
pub const WARNING_HEADER: &str = "Warning";
/// RFC 2616 section 14.46 warning for a transformed payload.
pub const WARNING_VALUE: &str = "214 Transformation applied";
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// One change to a header set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderEdit {
    Remove(&'static str),
    Add(String, String),
}

/// Header edits plus the page that replaces the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transform {
    pub edits: Vec<HeaderEdit>,
    pub body: Vec<u8>,
}

impl Transform {
    pub fn apply(&self, header: &mut Header) {
        for edit in &self.edits {
            match edit {
                HeaderEdit::Remove(name) => header.remove_any(name),
                HeaderEdit::Add(name, value) => header.add(name.clone(), value.clone()),
            }
        }
    }
}

/// Builds the edits and page for `verdict`. `host_uri` identifies the host
/// in the marker header.
pub fn transform(verdict: Verdict, host_uri: &str) -> Transform {
    let edits = vec![
        HeaderEdit::Remove("Content-Length"),
        HeaderEdit::Add(MARKER_HEADER.to_string(), host_uri.to_string()),
        HeaderEdit::Remove("Accept-Encoding"),
        HeaderEdit::Remove("Content-Disposition"),
        HeaderEdit::Remove("Content-Type"),
        HeaderEdit::Add("Content-Type".to_string(), HTML_CONTENT_TYPE.to_string()),
        HeaderEdit::Add(WARNING_HEADER.to_string(), WARNING_VALUE.to_string()),
    ];
    Transform {
        edits,
        body: response_page(verdict).into_bytes(),
    }
}

pub fn response_page(verdict: Verdict) -> String {
    let text = match verdict {
        Verdict::Allowed => "Success",
        Verdict::Blocked => "Blocked",
    };
    format!(
        "<HTML><HEAD><TITLE>{text}</TITLE></HEAD><BODY>{text}</BODY></HTML>",
        text = text
    )
}
