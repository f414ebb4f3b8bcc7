//! Session operations abstraction
//!
//! This module provides the session operations pattern that allows
//! transparent switching between plain TCP and TLS connections.
//!
//! The HTTP/2 engine only ever talks to a [`Session`]; how the bytes reach
//! the peer is decided by the [`Connector`] that produced it.

use crate::error::{Error, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::os::fd::AsRawFd;
use std::time::Duration;
use tracing::debug;

/// ALPN identifier for HTTP/2 over TLS (RFC 7540 Section 3.3)
pub const ALPN_H2: &[u8] = b"h2";

/// Session operations trait
///
/// This trait defines the operations that can be performed on a session,
/// abstracting over plain TCP and TLS connections.
pub trait SessionOps {
    /// Poll the session for events
    ///
    /// Returns true if the session is ready for the requested operation
    fn poll(&self, events: PollEvents, timeout: Option<Duration>) -> Result<bool>;

    /// Read data from the session
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write data to the session
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Close the session
    fn close(&mut self) -> Result<()>;

    /// Application protocol selected during session setup
    fn negotiated_protocol(&self) -> Option<&[u8]> {
        None
    }

    /// A second handle on the underlying socket, used to abort blocked I/O
    fn shutdown_handle(&self) -> Option<TcpStream> {
        None
    }
}

/// Poll events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvents {
    Read,
    Write,
}

/// Poll a raw socket descriptor
pub(crate) fn poll_fd(fd: i32, events: PollEvents, timeout: Option<Duration>) -> Result<bool> {
    use libc::{poll, pollfd, POLLIN, POLLOUT};

    let mut pfd = pollfd {
        fd,
        events: match events {
            PollEvents::Read => POLLIN,
            PollEvents::Write => POLLOUT,
        },
        revents: 0,
    };

    let timeout_ms = timeout
        .map(|d| d.as_millis().min(i32::MAX as u128) as i32)
        .unwrap_or(-1); // -1 = infinite

    let result = unsafe { poll(&mut pfd as *mut pollfd, 1, timeout_ms) };

    if result < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(Error::Io(err));
    }

    Ok(result > 0)
}

/// Map a socket-level error onto the crate error type
pub(crate) fn map_io_error(err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Error::Timeout,
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => Error::ConnectionClosed,
        _ => Error::Io(err),
    }
}

/// Session wrapping a transport with session operations
pub struct Session<S: SessionOps> {
    session: S,
    timeout: Option<Duration>,
}

impl<S: SessionOps> Session<S> {
    /// Create a new session with the given I/O timeout
    pub fn new(session: S, timeout: Option<Duration>) -> Self {
        Session { session, timeout }
    }

    /// Set the timeout for operations
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Get the timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Read data with timeout
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.session.poll(PollEvents::Read, self.timeout)? {
            return Err(Error::Timeout);
        }

        self.session.read(buf)
    }

    /// Write data with timeout
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if !self.session.poll(PollEvents::Write, self.timeout)? {
            return Err(Error::Timeout);
        }

        self.session.write(buf)
    }

    /// Fill `buf` completely
    ///
    /// A clean end of stream before `buf` is full is reported as
    /// [`Error::ConnectionClosed`].
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut read = 0;
        while read < buf.len() {
            let n = self.read(&mut buf[read..])?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            read += n;
        }
        Ok(())
    }

    /// Write all of `buf` and flush
    pub fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..])?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            written += n;
        }
        self.session.flush()
    }

    /// Close the session
    pub fn close(&mut self) -> Result<()> {
        self.session.close()
    }

    /// Get a reference to the underlying session
    pub fn get_ref(&self) -> &S {
        &self.session
    }

    /// Get a mutable reference to the underlying session
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

/// Plain file descriptor session operations
pub struct FdSessionOps {
    stream: TcpStream,
    protocol: Option<Vec<u8>>,
}

impl FdSessionOps {
    /// Create a new FD session operations from a TCP stream
    pub fn new(stream: TcpStream) -> Self {
        FdSessionOps {
            stream,
            protocol: None,
        }
    }

    /// Cleartext session that speaks HTTP/2 with prior knowledge (RFC 7540 Section 3.4)
    pub fn with_prior_knowledge(stream: TcpStream) -> Self {
        FdSessionOps {
            stream,
            protocol: Some(ALPN_H2.to_vec()),
        }
    }

    /// Get a reference to the underlying stream
    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }
}

impl SessionOps for FdSessionOps {
    fn poll(&self, events: PollEvents, timeout: Option<Duration>) -> Result<bool> {
        poll_fd(self.stream.as_raw_fd(), events, timeout)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf).map_err(map_io_error)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.stream.write(buf).map_err(map_io_error)
    }

    fn flush(&mut self) -> Result<()> {
        self.stream.flush().map_err(map_io_error)
    }

    fn close(&mut self) -> Result<()> {
        self.stream.shutdown(Shutdown::Both).map_err(Error::from)
    }

    fn negotiated_protocol(&self) -> Option<&[u8]> {
        self.protocol.as_deref()
    }

    fn shutdown_handle(&self) -> Option<TcpStream> {
        self.stream.try_clone().ok()
    }
}

/// Produces connected sessions for a destination
pub trait Connector {
    /// Session type produced by this connector
    type Session: SessionOps;

    /// URI scheme carried in the `:scheme` pseudo-header
    fn scheme(&self) -> &'static str;

    /// Open a session to `host:port`
    fn connect(&self, host: &str, port: u16, timeout: Option<Duration>) -> Result<Self::Session>;
}

/// Cleartext HTTP/2 connector using prior knowledge
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainConnector;

impl Connector for PlainConnector {
    type Session = FdSessionOps;

    fn scheme(&self) -> &'static str {
        "http"
    }

    fn connect(&self, host: &str, port: u16, timeout: Option<Duration>) -> Result<FdSessionOps> {
        let stream = connect_tcp(host, port, timeout)?;
        Ok(FdSessionOps::with_prior_knowledge(stream))
    }
}

/// Open a TCP connection with `TCP_NODELAY` set
///
/// Every resolved address is tried in order; the last failure is returned.
pub fn connect_tcp(host: &str, port: u16, timeout: Option<Duration>) -> Result<TcpStream> {
    let mut last_err = None;

    for addr in (host, port).to_socket_addrs()? {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nodelay(true)?;

        let connected = match timeout {
            Some(t) => socket.connect_timeout(&addr.into(), t),
            None => socket.connect(&addr.into()),
        };

        match connected {
            Ok(()) => {
                debug!(%addr, "TCP connection established");
                return Ok(socket.into());
            }
            Err(e) => {
                debug!(%addr, error = %e, "TCP connect attempt failed");
                last_err = Some(e);
            }
        }
    }

    Err(match last_err {
        Some(e) => map_io_error(e),
        None => Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("No addresses found for {}", host),
        )),
    })
}

/// Aborts blocked I/O on a connection from another thread
#[derive(Debug)]
pub struct ShutdownHandle {
    stream: TcpStream,
}

impl ShutdownHandle {
    pub(crate) fn new(stream: TcpStream) -> Self {
        ShutdownHandle { stream }
    }

    /// Shut down both directions of the socket
    ///
    /// Any read the connection is blocked in fails, and the connection
    /// resets to its closed state.
    pub fn shutdown(&self) -> io::Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}
