//! client side view of the other participants.
//!
//! A peer's clock offset maps its event timeline onto our playback timeline.
//! It is estimated exactly once, from the first event we ever see from that
//! id, and then reused for the whole connection.  Re-estimating mid-session
//! would make the shared timeline jump; a slightly off first estimate only
//! shifts that player by a constant, which nobody can hear.  A reconnecting
//! player shows up under a new id, so stale offsets die with the old id.
use std::collections::HashMap;
use std::fmt;

use crate::common::color::HsvColor;
use crate::common::roster::RosterEntry;

/// one-shot offset state.  explicit, not a sentinel value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockOffset {
    Unset,
    Established(f64),
}

pub struct Peer {
    pub id: String,
    pub origin: String,
    pub color: HsvColor,
    /// CSS form, converted once when the peer appears
    pub css_color: String,
    clock_offset: ClockOffset,
}

impl Peer {
    pub fn from_entry(entry: &RosterEntry) -> Peer {
        Peer {
            id: entry.id.clone(),
            origin: entry.origin.clone(),
            color: entry.color,
            css_color: entry.color.to_css_hsl(),
            clock_offset: ClockOffset::Unset,
        }
    }

    /// map this peer's timeline onto ours, estimating on first use.
    ///
    /// The first event from the peer fixes
    /// `offset = local_recv - sender_time + jitter_secs` and every later
    /// call returns that stored value untouched.  The jitter term is baked
    /// in once; it is not reapplied per event.
    pub fn offset_if_absent(
        &mut self,
        sender_time: f64,
        local_recv: f64,
        jitter_secs: f64,
    ) -> f64 {
        match self.clock_offset {
            ClockOffset::Established(offset) => offset,
            ClockOffset::Unset => {
                let offset = local_recv - sender_time + jitter_secs;
                self.clock_offset = ClockOffset::Established(offset);
                offset
            }
        }
    }

    pub fn offset(&self) -> ClockOffset {
        self.clock_offset
    }
}

impl fmt::Display for Peer {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.clock_offset {
            ClockOffset::Established(o) => {
                write!(f, "{{ id: {}, origin: {}, offset: {:.3} }}", self.id, self.origin, o)
            }
            ClockOffset::Unset => {
                write!(f, "{{ id: {}, origin: {}, offset: unset }}", self.id, self.origin)
            }
        }
    }
}

/// the peer table, maintained from relay roster snapshots
pub struct PeerRoster {
    peers: HashMap<String, Peer>,
}

impl PeerRoster {
    pub fn new() -> PeerRoster {
        PeerRoster {
            peers: HashMap::new(),
        }
    }

    /// reconcile with a full membership snapshot.
    ///
    /// Surviving ids keep their state (offsets included), new ids start
    /// fresh, ids missing from the snapshot are dropped entirely.
    pub fn apply_snapshot(&mut self, entries: &[RosterEntry]) -> () {
        self.peers.retain(|id, _| entries.iter().any(|e| &e.id == id));
        for entry in entries {
            if !self.peers.contains_key(&entry.id) {
                self.peers.insert(entry.id.clone(), Peer::from_entry(entry));
            }
        }
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Peer> {
        self.peers.get_mut(id)
    }

    pub fn get(&self, id: &str) -> Option<&Peer> {
        self.peers.get(id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod test_peer {
    use super::*;

    fn entry(id: &str) -> RosterEntry {
        RosterEntry {
            id: id.to_string(),
            origin: "10.0.0.1:9000".to_string(),
            color: HsvColor {
                h: 200.0,
                s: 0.9,
                v: 0.9,
            },
        }
    }

    #[test]
    fn offset_set_exactly_once() {
        let mut peer = Peer::from_entry(&entry("A"));
        assert_eq!(peer.offset(), ClockOffset::Unset);
        let first = peer.offset_if_absent(10.0, 10.15, 0.08);
        assert!((first - 0.23).abs() < 1e-9);
        // later calls with wildly different inputs return the stored value,
        // byte for byte
        let second = peer.offset_if_absent(50.0, 51.0, 0.5);
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(peer.offset(), ClockOffset::Established(first));
    }
    #[test]
    fn css_color_cached() {
        let peer = Peer::from_entry(&entry("A"));
        assert!(peer.css_color.starts_with("hsl("));
    }
}

#[cfg(test)]
mod test_peer_roster {
    use super::*;

    fn entry(id: &str) -> RosterEntry {
        RosterEntry {
            id: id.to_string(),
            origin: "10.0.0.1:9000".to_string(),
            color: HsvColor {
                h: 200.0,
                s: 0.9,
                v: 0.9,
            },
        }
    }

    #[test]
    fn snapshot_add_and_remove() {
        let mut roster = PeerRoster::new();
        roster.apply_snapshot(&[entry("A"), entry("B")]);
        assert_eq!(roster.len(), 2);
        roster.apply_snapshot(&[entry("B")]);
        assert_eq!(roster.len(), 1);
        assert!(roster.get("A").is_none());
        assert!(roster.get("B").is_some());
    }
    #[test]
    fn surviving_peer_keeps_its_offset() {
        let mut roster = PeerRoster::new();
        roster.apply_snapshot(&[entry("A"), entry("B")]);
        let offset = roster
            .get_mut("A")
            .unwrap()
            .offset_if_absent(10.0, 10.2, 0.05);
        // membership churn elsewhere must not disturb A's timeline
        roster.apply_snapshot(&[entry("A"), entry("C")]);
        let again = roster
            .get_mut("A")
            .unwrap()
            .offset_if_absent(99.0, 99.9, 0.9);
        assert_eq!(offset.to_bits(), again.to_bits());
    }
    #[test]
    fn reconnection_never_inherits_an_offset() {
        let mut roster = PeerRoster::new();
        roster.apply_snapshot(&[entry("A")]);
        roster
            .get_mut("A")
            .unwrap()
            .offset_if_absent(10.0, 10.2, 0.05);
        // A drops off, then the same human comes back as id "D"
        roster.apply_snapshot(&[]);
        roster.apply_snapshot(&[entry("D")]);
        assert_eq!(roster.get("D").unwrap().offset(), ClockOffset::Unset);
    }
}
