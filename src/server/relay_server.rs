//! listen for datagrams from clients and fan events out to the room.
//!
//! The socket read is non-blocking-ish (short timeout) so the prune timer
//! keeps running in a quiet room.  One datagram is handled to completion
//! before the next; the registry is only ever touched from this loop, so
//! there is nothing to lock.
//!
//! Failure semantics are best-effort by design: a send to a gone peer is
//! skipped, never retried or buffered.  A missed note beats a stalled room.
use log::{debug, info, warn};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use crate::common::box_error::BoxError;
use crate::common::note_packet::Frame;
use crate::common::sock_with_tos;
use crate::common::timekeeper::{get_micro_time, MicroTimer};
use crate::server::relay::{self, Delivery};
use crate::server::session_registry::SessionRegistry;

const PRUNE_INTERVAL: u128 = 1_000_000;

/// To start the relay hub, call this function.  It does not return.
pub fn run(port: u32) -> Result<(), BoxError> {
    let sock = sock_with_tos::new(port)?;
    sock.set_read_timeout(Some(Duration::new(0, 2_000_000)))?;
    info!("relay listening on udp port {}", port);

    let mut registry = SessionRegistry::new();
    let mut prune_timer = MicroTimer::new(get_micro_time(), PRUNE_INTERVAL);
    let mut buf = [0u8; 1500];

    loop {
        let now_time = get_micro_time();

        if prune_timer.expired(now_time) {
            prune_timer.reset(now_time);
            if registry.prune(now_time) {
                info!("pruned silent sessions, {} remain", registry.get_sessions().len());
                send_all(&sock, relay::roster_fan_out(&registry)?);
            }
        }

        match sock.recv_from(&mut buf) {
            Ok((amt, src)) => {
                handle_datagram(&sock, &mut registry, now_time, src, &buf[..amt])?;
            }
            Err(e) => match e.kind() {
                ErrorKind::WouldBlock => (),
                ErrorKind::TimedOut => (),
                _ => {
                    return Err(e.into());
                }
            },
        }
    }
}

fn handle_datagram(
    sock: &UdpSocket,
    registry: &mut SessionRegistry,
    now_time: u128,
    src: SocketAddr,
    data: &[u8],
) -> Result<(), BoxError> {
    match Frame::decode(data) {
        Ok(Frame::Ping) => {
            // answer immediately, before anything else.  the round trip is
            // what the clients size their jitter buffers from.
            send_one(sock, src, &Frame::Pong.encode()?);
            registry.touch(now_time, src);
        }
        Ok(Frame::Hello) => {
            let id = registry.connect(now_time, src);
            info!("session {} joined from {}", id, src);
            send_one(sock, src, &Frame::YourId(id).encode()?);
            send_all(sock, relay::roster_fan_out(registry)?);
        }
        Ok(Frame::Bye) => {
            if registry.disconnect(src) {
                info!("session at {} left", src);
                send_all(sock, relay::roster_fan_out(registry)?);
            }
        }
        Ok(Frame::Note { payload, .. }) => {
            // sender_id on the way up is ignored; identity is ours to assign
            registry.touch(now_time, src);
            send_all(sock, relay::fan_out(registry, src, &payload)?);
        }
        Ok(other) => {
            warn!("unexpected frame from {}: {:?}", src, other);
        }
        Err(e) => {
            debug!("undecodable datagram from {}: {}", src, e);
        }
    }
    Ok(())
}

fn send_all(sock: &UdpSocket, deliveries: Vec<Delivery>) -> () {
    for d in deliveries {
        send_one(sock, d.to, &d.data);
    }
}

fn send_one(sock: &UdpSocket, to: SocketAddr, data: &[u8]) -> () {
    if let Err(e) = sock.send_to(data, to) {
        // best effort.  skip and move on
        debug!("send to {} failed: {}", to, e);
    }
}
