// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Datagram transports.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::{debug, trace};

/// Fire-and-forget delivery of datagrams. Each buffer goes out as one packet; no ack.
pub trait Transport: Send + Sync {
    fn send_datagrams(&self, datagrams: &[Vec<u8>]) -> std::io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send_datagrams(&self, datagrams: &[Vec<u8>]) -> std::io::Result<()> {
        (**self).send_datagrams(datagrams)
    }
}

/// Sends datagrams over UDP to a single destination.
#[derive(Debug)]
pub struct UdpSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSender {
    /// Resolves `host:port` and binds an ephemeral local socket of the matching address family.
    pub fn new(host: &str, port: u16) -> std::io::Result<Self> {
        let target = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("could not resolve {host}:{port}"),
            )
        })?;
        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        debug!(
            "GELF UDP sender bound to {} targeting {}",
            socket.local_addr()?,
            target
        );
        Ok(Self { socket, target })
    }

    #[must_use]
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Transport for UdpSender {
    fn send_datagrams(&self, datagrams: &[Vec<u8>]) -> std::io::Result<()> {
        for datagram in datagrams {
            let sent = self.socket.send_to(datagram, self.target)?;
            trace!("Sent {} byte datagram to {}", sent, self.target);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_udp_sender_sends_each_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = receiver.local_addr().unwrap().port();

        let sender = UdpSender::new("127.0.0.1", port).unwrap();
        assert_eq!(sender.target().port(), port);
        sender
            .send_datagrams(&[b"first".to_vec(), b"second".to_vec()])
            .unwrap();

        let mut buf = [0u8; 64];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"first");
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"second");
    }

    #[test]
    fn test_unresolvable_host() {
        assert!(UdpSender::new("host.invalid.", 12201).is_err());
    }
}
