//! HTTP headers handling
//!
//! Headers keep insertion order and are looked up case-insensitively.

use super::{Error, Result, MAX_HEADERS};

/// HTTP headers collection
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: Vec<(String, String)>,
}

impl Headers {
    /// Create a new empty headers collection
    pub fn new() -> Self {
        Headers {
            headers: Vec::new(),
        }
    }

    /// Append a header; duplicates are kept
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Append a header received from a peer
    ///
    /// Fails with [`Error::TooLarge`] once [`MAX_HEADERS`] are held, so a
    /// header past the cap is never silently lost.
    pub fn try_insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        if self.headers.len() >= MAX_HEADERS {
            return Err(Error::TooLarge(format!("more than {} headers", MAX_HEADERS)));
        }
        self.insert(name, value);
        Ok(())
    }

    /// Get the first value for a header (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Check if a header exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declared body length, if any
    ///
    /// A present but unparseable value is an error rather than "no body".
    pub fn content_length(&self) -> Result<Option<usize>> {
        match self.get("Content-Length") {
            None => Ok(None),
            Some(v) => v
                .trim()
                .parse::<usize>()
                .map(Some)
                .map_err(|_| Error::Parse(format!("Invalid Content-Length: {}", v))),
        }
    }

    /// Iterate over all headers in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Parse a header line into name and value
    pub fn parse_header_line(line: &str) -> Result<(String, String)> {
        let Some((name, value)) = line.split_once(':') else {
            return Err(Error::InvalidHeader(format!("No colon in header: {}", line)));
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidHeader("Empty header name".to_string()));
        }

        Ok((name.to_string(), value.trim().to_string()))
    }
}
