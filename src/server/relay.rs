//! fan-out decisions, separated from the socket so they can be tested.
//!
//! The relay never interprets a note payload.  It looks the sender up by
//! source address, stamps the sender's id on the frame, and hands back the
//! list of datagrams to send.  An event from an address we don't know gets
//! dropped; identity comes from the registry, never from the payload.
use std::net::SocketAddr;

use crate::common::box_error::BoxError;
use crate::common::note_packet::Frame;
use crate::server::session_registry::SessionRegistry;

/// one datagram headed for one session
pub struct Delivery {
    pub to: SocketAddr,
    pub data: Vec<u8>,
}

/// build the deliveries for an event payload arriving from `from`.
///
/// Every open session except the sender gets a copy tagged with the
/// sender's id.  The sender gets nothing back; there is no echo.
pub fn fan_out(
    registry: &SessionRegistry,
    from: SocketAddr,
    payload: &[u8],
) -> Result<Vec<Delivery>, BoxError> {
    let sender = match registry.find_by_addr(from) {
        Some(s) => s,
        None => return Ok(vec![]), // not in the room, drop it
    };
    let frame = Frame::Note {
        sender_id: sender.id.clone(),
        payload: payload.to_vec(),
    };
    let data = frame.encode()?;
    Ok(registry
        .get_sessions()
        .iter()
        .filter(|s| s.address != from)
        .map(|s| Delivery {
            to: s.address,
            data: data.clone(),
        })
        .collect())
}

/// build a full membership snapshot delivery for every session.
///
/// Sent on every connect, disconnect, or prune.  Always the whole list.
pub fn roster_fan_out(registry: &SessionRegistry) -> Result<Vec<Delivery>, BoxError> {
    let data = Frame::Roster(registry.membership()).encode()?;
    Ok(registry
        .get_sessions()
        .iter()
        .map(|s| Delivery {
            to: s.address,
            data: data.clone(),
        })
        .collect())
}

#[cfg(test)]
mod test_relay {
    use super::*;

    fn addr(last: u8) -> SocketAddr {
        format!("10.0.0.{}:9000", last)
            .parse()
            .expect("Unable to parse socket address")
    }

    #[test]
    fn fan_out_reaches_everyone_but_the_sender() {
        let mut reg = SessionRegistry::new();
        let a = reg.connect(1000, addr(1));
        reg.connect(1000, addr(2));
        reg.connect(1000, addr(3));
        reg.connect(1000, addr(4));

        let payload = vec![0x90, 60, 100, 0, 0, 0, 0];
        let deliveries = fan_out(&reg, addr(1), &payload).unwrap();
        // exactly the 3 other peers, never the sender
        assert_eq!(deliveries.len(), 3);
        assert!(deliveries.iter().all(|d| d.to != addr(1)));
        for d in &deliveries {
            match Frame::decode(&d.data).unwrap() {
                Frame::Note { sender_id, payload: p } => {
                    assert_eq!(sender_id, a);
                    assert_eq!(p, payload);
                }
                other => panic!("wrong frame: {:?}", other),
            }
        }
    }
    #[test]
    fn unknown_sender_is_dropped() {
        let mut reg = SessionRegistry::new();
        reg.connect(1000, addr(1));
        let deliveries = fan_out(&reg, addr(9), &[1, 2, 3]).unwrap();
        assert!(deliveries.is_empty());
    }
    #[test]
    fn lone_player_gets_no_echo() {
        let mut reg = SessionRegistry::new();
        reg.connect(1000, addr(1));
        let deliveries = fan_out(&reg, addr(1), &[1, 2, 3]).unwrap();
        assert!(deliveries.is_empty());
    }
    #[test]
    fn roster_goes_to_all_and_is_full() {
        let mut reg = SessionRegistry::new();
        reg.connect(1000, addr(1));
        let b = reg.connect(1000, addr(2));
        reg.connect(1000, addr(3));
        reg.disconnect(addr(2));

        let deliveries = roster_fan_out(&reg).unwrap();
        assert_eq!(deliveries.len(), 2);
        for d in &deliveries {
            match Frame::decode(&d.data).unwrap() {
                Frame::Roster(entries) => {
                    assert_eq!(entries.len(), 2);
                    assert!(entries.iter().all(|e| e.id != b));
                }
                other => panic!("wrong frame: {:?}", other),
            }
        }
    }
}
