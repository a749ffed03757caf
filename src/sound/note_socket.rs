//! client side of the relay link.
use simple_error::bail;
use std::fmt;
use std::net::UdpSocket;
use std::time::Duration;

use crate::common::box_error::BoxError;
use crate::common::note_packet::Frame;
use crate::common::sock_with_tos;

/// client side socket: knows where the relay is, polls without blocking
pub struct NoteSocket {
    sock: UdpSocket,
    server: Option<String>,
}

impl NoteSocket {
    pub fn build() -> Result<NoteSocket, BoxError> {
        let sock = sock_with_tos::new(0)?;
        // poll, don't park.  the client loop has timers to service
        sock.set_read_timeout(Some(Duration::new(0, 1_000_000)))?;
        Ok(NoteSocket { sock, server: None })
    }
    pub fn connect(&mut self, host: &str, port: u32) -> () {
        self.server = Some(format!("{}:{}", host, port));
    }
    pub fn is_connected(&self) -> bool {
        self.server.is_some()
    }
    pub fn send(&self, frame: &Frame) -> Result<usize, BoxError> {
        match &self.server {
            Some(server) => Ok(self.sock.send_to(&frame.encode()?, server.as_str())?),
            None => bail!("socket not connected"),
        }
    }
    /// poll for one frame.  None means nothing arrived before the timeout.
    /// An undecodable datagram is also None; junk off the wire is not an
    /// error condition for the caller.
    pub fn recv(&self, buf: &mut [u8]) -> Result<Option<Frame>, BoxError> {
        match self.sock.recv_from(buf) {
            Ok((amt, _src)) => match Frame::decode(&buf[..amt]) {
                Ok(frame) => Ok(Some(frame)),
                Err(e) => {
                    log::debug!("undecodable datagram: {}", e);
                    Ok(None)
                }
            },
            Err(e) => match e.kind() {
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => Ok(None),
                _ => Err(e.into()),
            },
        }
    }
}

impl fmt::Display for NoteSocket {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.sock.local_addr() {
            Ok(addr) => write!(f, "{{ sock: {} }}", addr),
            Err(_) => write!(f, "{{ sock: ? }}"),
        }
    }
}
