//! Fire-and-forget datagram sink: one UDP datagram per formatted message.

use std::net::UdpSocket;

use crate::appender::{Appender, Encoding};
use crate::error::{LogError, Result};
use crate::level::Level;

/// Sends each formatted message as a single, unframed UDP datagram to a
/// fixed peer. There is no acknowledgement or retry; a send failure is
/// reported like any other appender failure and triggers quarantine.
pub struct UdpAppender {
    socket: UdpSocket,
    encoding: Encoding,
    scratch: Vec<u8>,
}

impl UdpAppender {
    pub fn connect(peer_address: &str) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|source| LogError::AppenderFailure {
            appender: "udp".to_string(),
            source,
        })?;
        socket
            .connect(peer_address)
            .map_err(|source| LogError::AppenderFailure {
                appender: "udp".to_string(),
                source,
            })?;
        Ok(UdpAppender {
            socket,
            encoding: Encoding::default(),
            scratch: Vec::new(),
        })
    }
}

impl Appender for UdpAppender {
    fn write(&mut self, _level: Level, message: &str) -> Result<()> {
        self.encoding.encode_into(message, &mut self.scratch);
        self.socket
            .send(&self.scratch)
            .map(|_| ())
            .map_err(|source| LogError::AppenderFailure {
                appender: "udp".to_string(),
                source,
            })
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_encoding(&mut self, encoding: Encoding) -> Result<()> {
        self.encoding = encoding;
        Ok(())
    }
}
