use rand::Rng;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::codec::{decode_message, encode_message, Message};
use crate::config::Config;
use crate::error::Result;

/// Bidirectional unreliable datagram endpoint. Delivers at-most-once,
/// unordered; may drop, duplicate, or reorder, per the transport contract
/// external to the core protocol (`spec.md` §4.5). This is peripheral —
/// the membership table and protocol handler never depend on the concrete
/// transport, only on `Message` in and out.
pub struct UdpTransport {
    socket: UdpSocket,
    loss_rate: f64,
    max_datagram_bytes: usize,
    bandwidth_used: u64,
}

impl UdpTransport {
    pub async fn bind(addr: &str, config: &Config) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self {
            socket,
            loss_rate: config.loss_rate,
            max_datagram_bytes: config.max_datagram_bytes,
            bandwidth_used: 0,
        })
    }

    /// Best-effort, fire-and-forget send. Failures are logged and counted,
    /// never propagated — best-effort semantics are part of the protocol
    /// (`spec.md` §7).
    pub async fn send(&mut self, message: &Message, dest_addr: &str) {
        let bytes = match encode_message(message) {
            Ok(b) => b,
            Err(e) => {
                warn!("Failed to encode outbound message: {e}");
                return;
            }
        };

        if bytes.len() > self.max_datagram_bytes {
            warn!(
                "Outbound {:?} to {dest_addr} is {} bytes, exceeds the {}-byte datagram bound; dropped",
                message.method,
                bytes.len(),
                self.max_datagram_bytes
            );
            return;
        }

        if self.loss_rate > 0.0 && rand::thread_rng().gen::<f64>() <= self.loss_rate {
            debug!("Simulated loss of outbound message to {dest_addr}");
            return;
        }

        match self.socket.send_to(&bytes, dest_addr).await {
            Ok(n) => {
                self.bandwidth_used += n as u64;
                debug!("Message sent to {dest_addr}");
            }
            Err(e) => warn!("Failed to send to {dest_addr}: {e}"),
        }
    }

    /// Blocking read of one datagram. Malformed payloads are the caller's
    /// responsibility to log and discard — this just surfaces the decode
    /// error rather than panicking.
    pub async fn recv(&mut self) -> Result<Message> {
        let mut buf = vec![0u8; self.max_datagram_bytes];
        let (n, _src) = self.socket.recv_from(&mut buf).await?;
        decode_message(&buf[..n])
    }

    pub fn bandwidth_used(&self) -> u64 {
        self.bandwidth_used
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.socket.local_addr()
    }
}
