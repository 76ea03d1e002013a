//! Datagram transports.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

/// Sends one datagram per call.
pub trait DatagramTransport {
    fn send(&mut self, payload: &[u8]) -> io::Result<()>;

    /// Called once before each batch of sends.
    fn begin_batch(&mut self) {}
}

struct Client {
    socket: UdpSocket,
    target: SocketAddr,
}

/// UDP transport to a statsd daemon.
///
/// The target is resolved on first use rather than at construction, and the
/// socket is dropped after a failed send so the next send resolves again.
/// A failed resolve is remembered until the next batch, so one unreachable
/// statsd host costs a single lookup per cycle.
pub struct UdpTransport {
    address: String,
    write_timeout: Duration,
    client: Option<Client>,
    connect_error: Option<(io::ErrorKind, String)>,
}

impl UdpTransport {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            write_timeout: Duration::from_secs(1),
            client: None,
            connect_error: None,
        }
    }

    fn connect(&self) -> io::Result<Client> {
        let target = self.address.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} resolved to no addresses", self.address),
            )
        })?;
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_write_timeout(Some(self.write_timeout))?;
        tracing::debug!(addr = %target, "statsd socket ready");
        Ok(Client { socket, target })
    }
}

impl DatagramTransport for UdpTransport {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        if let Some((kind, message)) = &self.connect_error {
            return Err(io::Error::new(*kind, message.clone()));
        }
        let client = match self.client.take() {
            Some(client) => client,
            None => self.connect().map_err(|e| {
                self.connect_error = Some((e.kind(), e.to_string()));
                e
            })?,
        };
        client.socket.send_to(payload, client.target)?;
        self.client = Some(client);
        Ok(())
    }

    fn begin_batch(&mut self) {
        self.connect_error = None;
    }
}

/// In-memory transport that records every payload.
///
/// Payloads containing `fail_on` are refused with an I/O error instead.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Vec<String>,
    fail_on: Option<String>,
    batches: usize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that refuses payloads containing `pattern`.
    pub fn failing_on(pattern: impl Into<String>) -> Self {
        Self {
            fail_on: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Payloads accepted so far, in send order.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Number of batches started.
    pub fn batches(&self) -> usize {
        self.batches
    }
}

impl DatagramTransport for RecordingTransport {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(payload).into_owned();
        if let Some(pattern) = &self.fail_on {
            if text.contains(pattern.as_str()) {
                return Err(io::Error::other("refused"));
            }
        }
        self.sent.push(text);
        Ok(())
    }

    fn begin_batch(&mut self) {
        self.batches += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udp_roundtrip() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let mut transport = UdpTransport::new(receiver.local_addr().unwrap().to_string());

        transport.send(b"a.b:1|g").unwrap();
        transport.send(b"a.c:2|g").unwrap();

        let mut buf = [0u8; 64];
        let n = receiver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"a.b:1|g");
        let n = receiver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"a.c:2|g");
    }

    #[test]
    fn test_unresolvable_host_fails_send() {
        let mut transport = UdpTransport::new("no-such-host.invalid:8125");
        assert!(transport.send(b"x:1|g").is_err());
        assert!(transport.client.is_none());
    }

    #[test]
    fn test_resolve_failure_held_for_batch() {
        let mut transport = UdpTransport::new("no-such-host.invalid:8125");
        transport.begin_batch();

        let first = transport.send(b"x:1|g").unwrap_err();
        let (kind, message) = transport.connect_error.clone().unwrap();
        assert_eq!(kind, first.kind());

        // Served from the cached failure
        let second = transport.send(b"y:1|g").unwrap_err();
        assert_eq!(second.kind(), kind);
        assert_eq!(second.to_string(), message);

        transport.begin_batch();
        assert!(transport.connect_error.is_none());
    }

    #[test]
    fn test_cached_failure_skips_lookup() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut transport = UdpTransport::new(receiver.local_addr().unwrap().to_string());
        transport.connect_error = Some((io::ErrorKind::NotFound, "earlier failure".to_string()));

        let err = transport.send(b"a.b:1|g").unwrap_err();
        assert_eq!(err.to_string(), "earlier failure");
        assert!(transport.client.is_none());

        transport.begin_batch();
        transport.send(b"a.b:1|g").unwrap();
        assert!(transport.client.is_some());
    }

    #[test]
    fn test_recording_transport() {
        let mut transport = RecordingTransport::failing_on("bad");
        transport.send(b"good:1|g").unwrap();
        assert!(transport.send(b"bad:1|g").is_err());
        assert_eq!(transport.sent(), ["good:1|g"]);
    }
}
