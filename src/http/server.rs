//! HTTP server implementation
//!
//! One connection is accepted, fully served, and closed before the next one
//! is accepted. Each connection carries exactly one request and one response.

use super::{
    Error, FdSessionOps, HttpRequest, HttpResponse, HttpSession, Limits, RequestParser, Result,
    SessionOps, Status, LISTEN_BACKLOG,
};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{SocketAddr, TcpListener};
use std::thread;
use std::time::Duration;

/// Default per-operation socket timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after a failed accept, so a persistent failure such as descriptor
/// exhaustion does not spin the loop
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Produces the response for a complete request
pub trait Handler {
    fn handle(&mut self, request: &HttpRequest) -> HttpResponse;
}

/// Body sent for requests that could not be framed
const FRAMING_FAILURE_BODY: &str = "{\"success\":false}";

/// Response for a request that failed to frame, if one should be sent
///
/// Timeouts, I/O failures and connections closed before any byte arrived get
/// no response at all.
pub fn framing_response(err: &Error) -> Option<HttpResponse> {
    match err {
        Error::InvalidMethod(_) => Some(HttpResponse::text(Status::NOT_FOUND, "Not Found")),
        Error::TooLarge(_) => Some(HttpResponse::json(
            Status::PAYLOAD_TOO_LARGE,
            FRAMING_FAILURE_BODY,
        )),
        Error::Parse(_) | Error::InvalidVersion(_) | Error::InvalidHeader(_) | Error::Incomplete => {
            Some(HttpResponse::json(Status::BAD_REQUEST, FRAMING_FAILURE_BODY))
        }
        Error::Io(_) | Error::Timeout | Error::ConnectionClosed => None,
    }
}

/// Read one request from a session
///
/// Reads until the parser has a complete request. End of stream before
/// any byte is [`Error::ConnectionClosed`]; end of stream part-way through
/// is [`Error::Incomplete`].
pub fn receive_request<S: SessionOps>(
    session: &mut HttpSession<S>,
    limits: Limits,
) -> Result<HttpRequest> {
    let mut parser = RequestParser::new(limits);
    let mut chunk = [0u8; 4096];

    loop {
        let n = session.read(&mut chunk)?;
        if n == 0 {
            return Err(if parser.has_data() {
                Error::Incomplete
            } else {
                Error::ConnectionClosed
            });
        }

        if let Some(request) = parser.parse(&chunk[..n])? {
            return Ok(request);
        }
    }
}

/// Serve a single connection: read, dispatch, respond, close
pub fn serve_connection<S: SessionOps, H: Handler>(
    session: &mut HttpSession<S>,
    handler: &mut H,
    limits: Limits,
) -> Result<()> {
    let response = match receive_request(session, limits) {
        Ok(request) => {
            tracing::info!(
                method = %request.method(),
                path = request.uri(),
                "Request"
            );
            handler.handle(&request)
        }
        Err(err) => match framing_response(&err) {
            Some(response) => {
                tracing::debug!(error = %err, status = response.status().code(), "Rejected request");
                response
            }
            None => {
                let _ = session.close();
                return Err(err);
            }
        },
    };

    let sent = session.write_all(&response.to_wire());
    let _ = session.close();
    sent
}

/// HTTP server bound to a listening socket
pub struct HttpServer {
    listener: TcpListener,
    limits: Limits,
    timeout: Option<Duration>,
}

impl HttpServer {
    /// Bind a listening socket with address reuse enabled
    pub fn bind(addr: SocketAddr, limits: Limits) -> Result<Self> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(LISTEN_BACKLOG)?;

        Ok(HttpServer {
            listener: socket.into(),
            limits,
            timeout: Some(DEFAULT_TIMEOUT),
        })
    }

    /// Set the per-operation timeout; `None` waits forever
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    fn accept(&self) -> Result<HttpSession<FdSessionOps>> {
        let (stream, peer) = self.listener.accept()?;
        tracing::trace!(%peer, "Accepted connection");
        Ok(HttpSession::new(FdSessionOps::new(stream), self.timeout))
    }

    /// Accept the next connection, backing off after a failure
    fn next_session(&self) -> Option<HttpSession<FdSessionOps>> {
        match self.accept() {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::warn!(error = %err, "Accept failed");
                thread::sleep(ACCEPT_BACKOFF);
                None
            }
        }
    }

    /// Accept and serve one connection
    pub fn serve_one<H: Handler>(&self, handler: &mut H) -> Result<()> {
        let mut session = self.accept()?;
        serve_connection(&mut session, handler, self.limits)
    }

    /// Serve connections one after another, forever
    ///
    /// Per-connection failures are logged and never stop the loop.
    pub fn serve<H: Handler>(&self, handler: &mut H) {
        loop {
            let Some(mut session) = self.next_session() else {
                continue;
            };
            match serve_connection(&mut session, handler, self.limits) {
                Ok(()) => {}
                Err(Error::ConnectionClosed) => {
                    tracing::debug!("Connection closed before a request arrived");
                }
                Err(err) => tracing::warn!(error = %err, "Connection failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::session::ScriptedSession;

    /// Echoes the method, path and body back as text
    struct Echo {
        seen: usize,
    }

    impl Handler for Echo {
        fn handle(&mut self, request: &HttpRequest) -> HttpResponse {
            self.seen += 1;
            let body = format!("{} {} {}", request.method(), request.path(), request.body_text());
            HttpResponse::text(Status::OK, body)
        }
    }

    fn run(chunks: Vec<Option<Vec<u8>>>) -> (Result<()>, ScriptedSession, usize) {
        let mut session = HttpSession::new(ScriptedSession::new(chunks), None);
        let mut echo = Echo { seen: 0 };
        let result = serve_connection(&mut session, &mut echo, Limits::default());
        (result, session.into_inner(), echo.seen)
    }

    fn written(session: &ScriptedSession) -> String {
        String::from_utf8_lossy(&session.written).into_owned()
    }

    #[test]
    fn test_dispatches_complete_request() {
        let (result, session, seen) = run(vec![Some(
            b"POST /api/delete?x=1 HTTP/1.1\r\nContent-Length: 6\r\n\r\nroll=5".to_vec(),
        )]);

        assert!(result.is_ok());
        assert_eq!(seen, 1);
        let out = written(&session);
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.ends_with("POST /api/delete roll=5"));
        assert!(session.closed);
    }

    #[test]
    fn test_reads_body_across_chunks() {
        let (result, session, _) = run(vec![
            Some(b"POST /data HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello".to_vec()),
            Some(b" world".to_vec()),
        ]);

        assert!(result.is_ok());
        assert!(written(&session).ends_with("POST /data hello world"));
    }

    #[test]
    fn test_unterminated_headers_get_bad_request() {
        let (result, session, seen) = run(vec![Some(
            b"POST /api/calculate HTTP/1.1\r\nContent-Length: 4".to_vec(),
        )]);

        assert!(result.is_ok());
        assert_eq!(seen, 0);
        let out = written(&session);
        assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(out.contains("Content-Type: application/json\r\n"));
        assert!(out.ends_with("{\"success\":false}"));
    }

    #[test]
    fn test_short_body_gets_bad_request() {
        let (_, session, seen) = run(vec![Some(
            b"POST /api/calculate HTTP/1.1\r\nContent-Length: 40\r\n\r\nname=x".to_vec(),
        )]);

        assert_eq!(seen, 0);
        assert!(written(&session).starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[test]
    fn test_unknown_method_gets_not_found() {
        let (_, session, seen) = run(vec![Some(b"BREW /pot HTTP/1.1\r\n\r\n".to_vec())]);

        assert_eq!(seen, 0);
        let out = written(&session);
        assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(out.ends_with("Not Found"));
    }

    #[test]
    fn test_oversized_body_gets_payload_too_large() {
        let (_, session, _) = run(vec![Some(
            b"POST / HTTP/1.1\r\nContent-Length: 999999\r\n\r\n".to_vec(),
        )]);
        assert!(written(&session).starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    }

    #[test]
    fn test_too_many_headers_get_payload_too_large() {
        let mut raw = b"GET /api/records HTTP/1.1\r\n".to_vec();
        for i in 0..=crate::http::MAX_HEADERS {
            raw.extend_from_slice(format!("X-Filler-{}: 1\r\n", i).as_bytes());
        }
        raw.extend_from_slice(b"\r\n");

        let (_, session, seen) = run(vec![Some(raw)]);
        assert_eq!(seen, 0);
        assert!(written(&session).starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    }

    #[test]
    fn test_failed_accept_backs_off() {
        use std::time::Instant;

        let server = HttpServer::bind("127.0.0.1:0".parse().unwrap(), Limits::default()).unwrap();
        // No pending connection, so accept fails with WouldBlock
        server.listener.set_nonblocking(true).unwrap();

        let started = Instant::now();
        assert!(server.next_session().is_none());
        assert!(started.elapsed() >= ACCEPT_BACKOFF);
    }

    #[test]
    fn test_silent_close_and_timeout_write_nothing() {
        let (result, session, _) = run(vec![]);
        assert!(matches!(result, Err(Error::ConnectionClosed)));
        assert!(session.written.is_empty());
        assert!(session.closed);

        let (result, session, _) = run(vec![Some(b"GET / HT".to_vec()), None]);
        assert!(matches!(result, Err(Error::Timeout)));
        assert!(session.written.is_empty());
    }

    #[test]
    fn test_framing_response_mapping() {
        assert!(framing_response(&Error::Timeout).is_none());
        assert!(framing_response(&Error::ConnectionClosed).is_none());
        assert_eq!(
            framing_response(&Error::Incomplete).unwrap().status(),
            Status::BAD_REQUEST
        );
        assert_eq!(
            framing_response(&Error::InvalidMethod("BREW".into())).unwrap().status(),
            Status::NOT_FOUND
        );
    }

    #[test]
    fn test_server_serves_over_tcp() {
        use std::io::{Read, Write};
        use std::net::TcpStream;
        use std::thread;

        let server = HttpServer::bind("127.0.0.1:0".parse().unwrap(), Limits::default()).unwrap();
        let addr = server.local_addr().unwrap();

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(b"GET /ping HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
            let mut response = String::new();
            stream.read_to_string(&mut response).unwrap();
            response
        });

        let mut echo = Echo { seen: 0 };
        server.serve_one(&mut echo).unwrap();

        let response = client.join().unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Connection: close\r\n"));
        assert!(response.ends_with("GET /ping "));
    }
}
