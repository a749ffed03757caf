//! UDP socket with the low-delay TOS bit set.
//!
//! Note traffic is tiny and latency is the whole game, so both the relay
//! and the client mark their datagrams for low-delay handling.
use socket2::{Domain, SockAddr, Socket, Type};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use crate::common::box_error::BoxError;

/// bind on 0.0.0.0.  port 0 lets the OS pick.
pub fn new(port: u32) -> Result<UdpSocket, BoxError> {
    let raw_sock = Socket::new(Domain::IPV4, Type::DGRAM, None)?;
    raw_sock.set_tos(0x10)?;
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), port as u16);
    raw_sock.bind(&SockAddr::from(addr))?;
    Ok(UdpSocket::from(raw_sock))
}
