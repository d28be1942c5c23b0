//! HTTP/1.x request handling
//!
//! A small, hand-rolled HTTP/1.0 and HTTP/1.1 server layer: one request per
//! connection, no keep-alive, responses always carry `Connection: close`.
//!
//! # Architecture
//!
//! - `SessionOps` abstracts the transport (poll, read, write, close), so the
//!   connection code runs unchanged over a TCP stream or an in-memory script
//! - `RequestParser` frames a request incrementally, honouring
//!   `Content-Length` and the configured size limits
//! - `HttpServer` owns the listening socket and drives each accepted
//!   connection through a `Handler`
//!
//! # Examples
//!
//! ```no_run
//! use gradebook::http::{Handler, HttpRequest, HttpResponse, HttpServer, Limits, Status};
//!
//! struct Hello;
//!
//! impl Handler for Hello {
//!     fn handle(&mut self, _request: &HttpRequest) -> HttpResponse {
//!         HttpResponse::text(Status::OK, "hello")
//!     }
//! }
//!
//! let server = HttpServer::bind("127.0.0.1:8080".parse().unwrap(), Limits::default()).unwrap();
//! server.serve(&mut Hello);
//! ```

pub mod headers;
pub mod message;
pub mod parser;
pub mod server;
pub mod session;

pub use headers::Headers;
pub use message::{HttpRequest, HttpResponse, Method, Status, Version};
pub use parser::{Limits, RequestParser};
pub use server::{Handler, HttpServer};
pub use session::{FdSessionOps, HttpSession, SessionOps};

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP operation errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidVersion(String),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Incomplete message")]
    Incomplete,

    #[error("Message too large: {0}")]
    TooLarge(String),

    #[error("Timeout")]
    Timeout,

    #[error("Connection closed")]
    ConnectionClosed,
}

/// Maximum number of headers per message
pub const MAX_HEADERS: usize = 64;

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Pending-connection queue length for the listening socket
pub const LISTEN_BACKLOG: i32 = 10;

/// CRLF line ending
pub const CRLF: &str = "\r\n";
