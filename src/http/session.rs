//! Session operations abstraction
//!
//! Connection handling talks to a `SessionOps` implementation rather than a
//! socket, so the same code runs over a TCP stream in production and over a
//! scripted in-memory session in tests.

use super::{Error, Result};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::fd::AsRawFd;
use std::time::Duration;

/// Transport operations for one connection
pub trait SessionOps {
    /// Wait until the session is ready for the requested operation
    ///
    /// Returns false if the timeout elapsed first.
    fn poll(&self, events: PollEvents, timeout: Option<Duration>) -> Result<bool>;

    /// Read data from the session; 0 means the peer finished sending
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write data to the session
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Close the session
    fn close(&mut self) -> Result<()>;
}

/// Poll events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvents {
    Read,
    Write,
}

/// Session with a per-operation timeout
pub struct HttpSession<S: SessionOps> {
    session: S,
    timeout: Option<Duration>,
}

impl<S: SessionOps> HttpSession<S> {
    pub fn new(session: S, timeout: Option<Duration>) -> Self {
        HttpSession { session, timeout }
    }

    /// Read once, failing with [`Error::Timeout`] if nothing arrives in time
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.session.poll(PollEvents::Read, self.timeout)? {
            return Err(Error::Timeout);
        }
        self.session.read(buf)
    }

    /// Write the whole buffer, waiting for writability before each chunk
    pub fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < buf.len() {
            if !self.session.poll(PollEvents::Write, self.timeout)? {
                return Err(Error::Timeout);
            }
            let n = self.session.write(&buf[written..])?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            written += n;
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.session.close()
    }

    pub fn get_ref(&self) -> &S {
        &self.session
    }

    pub fn into_inner(self) -> S {
        self.session
    }
}

/// Plain TCP session operations
pub struct FdSessionOps {
    stream: TcpStream,
}

impl FdSessionOps {
    pub fn new(stream: TcpStream) -> Self {
        FdSessionOps { stream }
    }
}

impl SessionOps for FdSessionOps {
    fn poll(&self, events: PollEvents, timeout: Option<Duration>) -> Result<bool> {
        use libc::{poll, pollfd, POLLIN, POLLOUT};

        let mut pfd = pollfd {
            fd: self.stream.as_raw_fd(),
            events: match events {
                PollEvents::Read => POLLIN,
                PollEvents::Write => POLLOUT,
            },
            revents: 0,
        };

        // -1 waits forever
        let timeout_ms = timeout
            .map(|d| d.as_millis().min(i32::MAX as u128) as i32)
            .unwrap_or(-1);

        loop {
            // SAFETY: pfd is a valid pollfd for the duration of the call and
            // the descriptor stays open while self.stream is alive.
            let result = unsafe { poll(&mut pfd as *mut pollfd, 1, timeout_ms) };

            if result >= 0 {
                return Ok(result > 0);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(Error::Io(err));
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf).map_err(Error::from)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.stream.write(buf).map_err(Error::from)
    }

    fn close(&mut self) -> Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Peer already gone
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// In-memory session for exercising connection handling without sockets
///
/// Reads are served from the scripted chunks in order, one chunk per read,
/// then end-of-stream. A `None` chunk simulates a read timeout.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedSession {
    chunks: std::collections::VecDeque<Option<Vec<u8>>>,
    pub(crate) written: Vec<u8>,
    pub(crate) closed: bool,
}

#[cfg(test)]
impl ScriptedSession {
    pub(crate) fn new(chunks: Vec<Option<Vec<u8>>>) -> Self {
        ScriptedSession {
            chunks: chunks.into(),
            written: Vec::new(),
            closed: false,
        }
    }

    /// Session delivering the whole input in one read
    pub(crate) fn from_bytes(input: &[u8]) -> Self {
        Self::new(vec![Some(input.to_vec())])
    }
}

#[cfg(test)]
impl SessionOps for ScriptedSession {
    fn poll(&self, events: PollEvents, _timeout: Option<Duration>) -> Result<bool> {
        match events {
            PollEvents::Read => Ok(!matches!(self.chunks.front(), Some(None))),
            PollEvents::Write => Ok(true),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.chunks.pop_front() {
            Some(Some(mut chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    self.chunks.push_front(Some(chunk.split_off(n)));
                }
                Ok(n)
            }
            Some(None) | None => Ok(0),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
