//! UDP transport layer.
//!
//! The transport only moves datagrams; it knows nothing about frames or
//! parameters. [`Transport`] is the seam the [`Client`](crate::Client) talks
//! through, and [`UdpTransport`] is the implementation for real devices.
//!
//! # Design
//!
//! - **Protocol agnostic** - handles only byte transmission
//! - **Synchronous** - blocking send/receive with a fixed timeout
//! - **One request in flight** - responses carry no correlation ID, so stale
//!   datagrams are drained before every exchange
//!
//! # Example
//!
//! ```no_run
//! use ecovent::{Transport, UdpTransport};
//! use std::time::Duration;
//!
//! let mut transport = UdpTransport::new(
//!     "192.168.1.30:4000".parse().unwrap(),
//!     Duration::from_secs(4),
//! ).unwrap();
//!
//! let request = vec![0xFD, 0xFD, 0x02, /* ... rest of the frame */];
//! let response = transport.send_receive(&request);
//! ```

use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use crate::error::{Result, VentError};

/// Default UDP port of the ventilation units.
pub const DEFAULT_PORT: u16 = 4000;

/// Default timeout for UDP operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

/// Receive buffer size; a full read-all reply is well below it.
pub const MAX_PACKET_SIZE: usize = 4096;

/// Datagram exchange with one device.
pub trait Transport {
    /// Sends a frame without waiting for a reply.
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Sends a frame and returns the next datagram received.
    ///
    /// Returns `VentError::Timeout` if nothing arrives in time.
    fn send_receive(&mut self, data: &[u8]) -> Result<Vec<u8>>;

    /// Discards datagrams already queued, returning how many were dropped.
    fn drain_pending(&mut self) -> Result<usize> {
        Ok(0)
    }
}

/// UDP transport connected to a single device.
pub struct UdpTransport {
    socket: UdpSocket,
    remote_addr: SocketAddr,
}

impl UdpTransport {
    /// Creates a transport connected to `device_addr`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the socket cannot be created or configured.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ecovent::UdpTransport;
    /// use std::time::Duration;
    ///
    /// let transport = UdpTransport::new(
    ///     "192.168.1.30:4000".parse().unwrap(),
    ///     Duration::from_secs(4),
    /// ).unwrap();
    /// ```
    pub fn new(device_addr: SocketAddr, timeout: Duration) -> Result<Self> {
        let bind_addr = if device_addr.is_ipv6() {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        };

        let socket = UdpSocket::bind(bind_addr)?;
        // Connected sockets only accept datagrams from the device.
        socket.connect(device_addr)?;
        socket.set_read_timeout(Some(timeout))?;
        socket.set_write_timeout(Some(timeout))?;

        Ok(Self {
            socket,
            remote_addr: device_addr,
        })
    }

    /// Creates a transport with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the socket cannot be created or configured.
    pub fn with_default_timeout(device_addr: SocketAddr) -> Result<Self> {
        Self::new(device_addr, DEFAULT_TIMEOUT)
    }

    /// Returns the device address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Returns a reference to the underlying socket.
    pub fn socket(&self) -> &UdpSocket {
        &self.socket
    }
}

fn map_io_error(e: std::io::Error) -> VentError {
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => VentError::Timeout,
        _ => VentError::Io(e),
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.socket.send(data).map_err(map_io_error)?;
        Ok(())
    }

    fn send_receive(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.drain_pending()?;
        self.socket.send(data).map_err(map_io_error)?;

        let mut buffer = vec![0u8; MAX_PACKET_SIZE];
        let size = self.socket.recv(&mut buffer).map_err(map_io_error)?;
        buffer.truncate(size);
        Ok(buffer)
    }

    fn drain_pending(&mut self) -> Result<usize> {
        self.socket.set_nonblocking(true)?;
        let mut buffer = [0u8; MAX_PACKET_SIZE];
        let mut dropped = 0;
        let outcome = loop {
            match self.socket.recv(&mut buffer) {
                Ok(_) => dropped += 1,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break Ok(()),
                // ICMP port unreachable from an earlier send surfaces here
                Err(e) if e.kind() == ErrorKind::ConnectionRefused => break Ok(()),
                Err(e) => break Err(VentError::Io(e)),
            }
        };
        self.socket.set_nonblocking(false)?;
        outcome?;

        if dropped > 0 {
            log::debug!("dropped {} stale datagram(s) from {}", dropped, self.remote_addr);
        }
        Ok(dropped)
    }
}

impl std::fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpTransport")
            .field("remote_addr", &self.remote_addr)
            .field("local_addr", &self.socket.local_addr().ok())
            .finish()
    }
}
