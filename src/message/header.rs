use serde::Serialize;

/// Ordered header fields of an HTTP message.
///
/// Field names compare case-insensitively; repeated fields are kept in
/// arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Header {
    fields: Vec<(String, String)>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn has_any(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Removes every field called `name`.
    pub fn remove_any(&mut self, name: &str) {
        self.fields.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// First value of `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Header {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

/// Body attached to a message. Only presence and declared size matter to
/// the adapter; content flows through the transaction callbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Body {
    /// Declared size, `None` when unknown.
    pub size: Option<u64>,
}

/// An HTTP message as seen by the adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Request or status line, opaque to the adapter.
    pub first_line: String,
    pub header: Header,
    pub body: Option<Body>,
}

impl Message {
    pub fn new(first_line: impl Into<String>, header: Header, body: Option<Body>) -> Self {
        Self {
            first_line: first_line.into(),
            header,
            body,
        }
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_case_insensitive() {
        let mut header: Header = [("Content-Length", "12"), ("content-length", "13")]
            .into_iter()
            .collect();
        header.add("Accept-Encoding", "gzip");
        assert!(header.has_any("CONTENT-LENGTH"));
        assert_eq!(header.value("content-Length"), Some("12"));
        assert_eq!(header.values("Content-Length").count(), 2);
        header.remove_any("Content-length");
        assert!(!header.has_any("Content-Length"));
        assert_eq!(header.len(), 1);
    }

    #[test]
    fn test_add_keeps_order() {
        let mut header = Header::new();
        header.add("Warning", "199 first");
        header.add("X-Other", "x");
        header.add("Warning", "214 second");
        let names: Vec<_> = header.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Warning", "X-Other", "Warning"]);
        assert_eq!(
            header.values("warning").collect::<Vec<_>>(),
            vec!["199 first", "214 second"]
        );
    }
}
