//! The datagram messenger: the game core only ever talks to peers through
//! the [`Messenger`] trait below, so the socket itself is a pluggable detail.

use crate::utils::prelude::*;
use std::fmt;
use std::net::{SocketAddr, UdpSocket};

/// An opaque, copyable, comparable peer handle. Concretely a socket address,
/// but the game core never inspects it beyond equality and display.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Addr(pub SocketAddr);

impl fmt::Debug for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A best-effort, length-bounded, address-keyed send/receive substrate.
///
/// Implementations must never block the caller indefinitely and must treat
/// send failures as non-fatal: a dead peer is simply dropped on the next
/// send attempt.
pub trait Messenger {
    /// Sends `message` to `to`. Failures are swallowed by the implementation;
    /// callers never need to retry.
    fn send(&self, to: Addr, message: &str);

    /// Attempts to receive one datagram without blocking past `timeout`.
    /// Returns `None` on a read timeout, an empty message, or any non-fatal
    /// receive error.
    fn recv(&self, timeout: std::time::Duration) -> Option<(Addr, String)>;
}

/// The real, UDP-backed messenger used by the `server` and `client` binaries.
pub struct UdpMessenger {
    socket: UdpSocket,
}

impl UdpMessenger {
    pub fn bind(addr: &str) -> Result<UdpMessenger> {
        let socket = UdpSocket::bind(addr).with_context(|| format!("could not bind {addr}"))?;
        Ok(UdpMessenger { socket })
    }

    /// Creates a socket bound to an ephemeral port and connected to a single
    /// peer, as a client does.
    pub fn connect(local: &str, remote: &str) -> Result<UdpMessenger> {
        let socket = UdpSocket::bind(local).with_context(|| format!("could not bind {local}"))?;
        socket
            .connect(remote)
            .with_context(|| format!("could not connect to {remote}"))?;
        Ok(UdpMessenger { socket })
    }

    pub fn local_addr(&self) -> Result<Addr> {
        Ok(Addr(self.socket.local_addr()?))
    }
}

impl Messenger for UdpMessenger {
    fn send(&self, to: Addr, message: &str) {
        if message.len() > MAX_BYTES {
            log::warn!("dropping oversized outbound message to {to} ({} bytes)", message.len());
            return;
        }
        if let Err(err) = self.socket.send_to(message.as_bytes(), to.0) {
            log::debug!("send to {to} failed (peer likely gone): {err}");
        }
    }

    fn recv(&self, timeout: std::time::Duration) -> Option<(Addr, String)> {
        self.socket.set_read_timeout(Some(timeout)).ok()?;
        let mut buf = vec![0u8; MAX_BYTES];
        match self.socket.recv_from(&mut buf) {
            Ok((n, from)) => {
                let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                if text.is_empty() {
                    None
                } else {
                    Some((Addr(from), text))
                }
            }
            Err(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut =>
            {
                None
            }
            Err(err) => {
                log::debug!("recv failed: {err}");
                None
            }
        }
    }
}

/// An in-memory test double recording every outbound message, keyed by
/// recipient, for assertions in integration-style tests.
#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    pub struct ChannelMessenger {
        pub sent: RefCell<Vec<(Addr, String)>>,
    }

    impl ChannelMessenger {
        pub fn new() -> ChannelMessenger {
            ChannelMessenger::default()
        }

        pub fn sent_to(&self, to: Addr) -> Vec<String> {
            self.sent
                .borrow()
                .iter()
                .filter(|(a, _)| *a == to)
                .map(|(_, m)| m.clone())
                .collect()
        }

        pub fn clear(&self) {
            self.sent.borrow_mut().clear();
        }
    }

    impl Messenger for ChannelMessenger {
        fn send(&self, to: Addr, message: &str) {
            self.sent.borrow_mut().push((to, message.to_string()));
        }

        fn recv(&self, _timeout: std::time::Duration) -> Option<(Addr, String)> {
            None
        }
    }
}
