//! Outbound packet transport

use std::io;
use std::net::{SocketAddr, UdpSocket};

use crate::net::packet::Packet;

/// Consumer of outbound packets, one call per tick.
pub trait PacketSink {
    fn send(&mut self, packet: &Packet) -> io::Result<()>;
}

/// UDP sink broadcasting each packet to one or more destinations.
///
/// Delivery is fire-and-forget; loss is tolerated by contract, so there is
/// no acknowledgement or retry.
pub struct UdpSink {
    socket: UdpSocket,
    destinations: Vec<SocketAddr>,
}

impl UdpSink {
    /// Bind an ephemeral local socket for the given destinations.
    pub fn new(destinations: Vec<SocketAddr>) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            socket,
            destinations,
        })
    }
}

impl PacketSink for UdpSink {
    fn send(&mut self, packet: &Packet) -> io::Result<()> {
        for destination in &self.destinations {
            self.socket.send_to(packet.as_bytes(), destination)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket;
    use std::time::Duration;

    #[test]
    fn sink_delivers_to_every_destination() {
        let rx_a = UdpSocket::bind("127.0.0.1:0").unwrap();
        let rx_b = UdpSocket::bind("127.0.0.1:0").unwrap();
        rx_a.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        rx_b.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

        let mut sink = UdpSink::new(vec![
            rx_a.local_addr().unwrap(),
            rx_b.local_addr().unwrap(),
        ])
        .unwrap();

        let packet = Packet::new(b'k', [1, 2, 3]);
        sink.send(&packet).unwrap();

        for rx in [&rx_a, &rx_b] {
            let mut buf = [0u8; 16];
            let n = rx.recv(&mut buf).unwrap();
            assert_eq!(&buf[..n], packet.as_bytes());
            assert!(Packet::verify(&buf[..n]));
        }
    }
}
