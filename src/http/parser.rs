//! HTTP request parsing
//!
//! Requests are framed incrementally: bytes are fed as they arrive and the
//! parser reports a complete request once the header block is terminated and
//! `Content-Length` bytes of body have been seen. Without `Content-Length`,
//! whatever arrived together with the header block is the body.

use super::{Error, Headers, HttpRequest, Method, Result, Version};
use bytes::{Buf, BytesMut};

/// Default cap on request line plus headers
pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;

/// Default cap on a declared request body
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Size limits applied while framing a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Find the next CRLF in a buffer
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Parse HTTP request line
///
/// Format: METHOD URI VERSION
/// Example: POST /api/calculate HTTP/1.1
pub fn parse_request_line(line: &str) -> Result<(Method, String, Version)> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.len() != 3 {
        return Err(Error::Parse(format!(
            "Invalid request line: expected 3 parts, got {}",
            parts.len()
        )));
    }

    let version: Version = parts[2].parse()?;
    let method: Method = parts[0].parse()?;

    Ok((method, parts[1].to_string(), version))
}

/// Request line components, held until the request is complete
#[derive(Debug, Clone)]
struct RequestHead {
    method: Method,
    uri: String,
    version: Version,
    headers: Headers,
}

impl RequestHead {
    fn into_request(self, body: Vec<u8>) -> HttpRequest {
        HttpRequest::builder()
            .method(self.method)
            .uri(self.uri)
            .version(self.version)
            .headers(self.headers)
            .body(body)
            .build()
    }
}

#[derive(Debug)]
enum ParserState {
    RequestLine,
    Headers(RequestHead),
    Body(RequestHead, usize),
    Complete,
}

enum Step {
    Advance(ParserState),
    NeedMore(ParserState),
    Done(HttpRequest),
}

/// Incremental HTTP request parser
#[derive(Debug)]
pub struct RequestParser {
    state: ParserState,
    buffer: BytesMut,
    limits: Limits,
    head_bytes: usize,
    received: usize,
}

impl RequestParser {
    pub fn new(limits: Limits) -> Self {
        RequestParser {
            state: ParserState::RequestLine,
            buffer: BytesMut::with_capacity(4096),
            limits,
            head_bytes: 0,
            received: 0,
        }
    }

    /// Whether any bytes have been fed since creation
    pub fn has_data(&self) -> bool {
        self.received > 0
    }

    /// Feed data to the parser
    ///
    /// Returns Ok(Some(request)) when a complete request is parsed,
    /// Ok(None) if more data is needed, or Err on a framing error.
    pub fn parse(&mut self, data: &[u8]) -> Result<Option<HttpRequest>> {
        self.received += data.len();
        self.buffer.extend_from_slice(data);

        loop {
            let state = std::mem::replace(&mut self.state, ParserState::Complete);
            match self.step(state)? {
                Step::Advance(next) => self.state = next,
                Step::NeedMore(current) => {
                    self.state = current;
                    return Ok(None);
                }
                Step::Done(request) => return Ok(Some(request)),
            }
        }
    }

    fn step(&mut self, state: ParserState) -> Result<Step> {
        match state {
            ParserState::RequestLine => {
                let Some(line) = self.take_line()? else {
                    return Ok(Step::NeedMore(ParserState::RequestLine));
                };
                let (method, uri, version) = parse_request_line(&line)?;
                Ok(Step::Advance(ParserState::Headers(RequestHead {
                    method,
                    uri,
                    version,
                    headers: Headers::new(),
                })))
            }
            ParserState::Headers(mut head) => {
                let Some(line) = self.take_line()? else {
                    return Ok(Step::NeedMore(ParserState::Headers(head)));
                };
                if !line.is_empty() {
                    let (name, value) = Headers::parse_header_line(&line)?;
                    head.headers.try_insert(name, value)?;
                    return Ok(Step::Advance(ParserState::Headers(head)));
                }

                // Empty line marks end of headers
                match head.headers.content_length()? {
                    Some(len) if len > self.limits.max_body_bytes => Err(Error::TooLarge(format!(
                        "body of {} bytes exceeds {}",
                        len, self.limits.max_body_bytes
                    ))),
                    Some(len) => Ok(Step::Advance(ParserState::Body(head, len))),
                    None => {
                        let body = self.buffer.split().to_vec();
                        Ok(Step::Done(head.into_request(body)))
                    }
                }
            }
            ParserState::Body(head, len) => {
                if self.buffer.len() < len {
                    return Ok(Step::NeedMore(ParserState::Body(head, len)));
                }
                let body = self.buffer.split_to(len).to_vec();
                Ok(Step::Done(head.into_request(body)))
            }
            ParserState::Complete => Ok(Step::NeedMore(ParserState::Complete)),
        }
    }

    /// Take one CRLF-terminated line from the header section
    fn take_line(&mut self) -> Result<Option<String>> {
        match find_crlf(&self.buffer) {
            Some(pos) => {
                self.head_bytes += pos + 2;
                if self.head_bytes > self.limits.max_header_bytes {
                    return Err(self.header_overflow());
                }
                let line = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
                self.buffer.advance(pos + 2);
                Ok(Some(line))
            }
            None if self.head_bytes + self.buffer.len() > self.limits.max_header_bytes => {
                Err(self.header_overflow())
            }
            None => Ok(None),
        }
    }

    fn header_overflow(&self) -> Error {
        Error::TooLarge(format!(
            "header section exceeds {} bytes",
            self.limits.max_header_bytes
        ))
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}
