//! who is in the session right now.  Used to fan events out to them.
//!
//! The relay adds a session on hello, refreshes it on any traffic, and
//! drops it on bye or silence.  Ids come off a monotonic counter so an id
//! is never reused while the relay process runs; a client that drops and
//! comes back gets a fresh id and all receivers start it with fresh state.
use std::fmt;
use std::net::SocketAddr;

use crate::common::color::HsvColor;
use crate::common::roster::RosterEntry;

// This is how long a session lasts until we boot it (if it goes silent).
// Clients ping every 5 seconds, so three missed pings is gone.
const SESSION_EXPIRATION_IN_MICROSECONDS: u128 = 15_000_000;

// compact printable alphabet for connection ids
const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// encode a counter value into a short printable id
fn encode_id(mut serial: u64) -> String {
    if serial == 0 {
        return (ID_ALPHABET[0] as char).to_string();
    }
    let mut chars: Vec<char> = vec![];
    while serial > 0 {
        chars.push(ID_ALPHABET[(serial % 64) as usize] as char);
        serial /= 64;
    }
    chars.iter().rev().collect()
}

/// one connected participant as the relay sees it
///
/// - id - assigned at connect time, never reused this process lifetime
/// - address - where datagrams for this session get sent
/// - origin - human readable origin label, immutable
/// - color - assigned at connect time, immutable
/// - keep_alive - microsecond timestamp of the last traffic we saw
pub struct Session {
    pub id: String,
    pub address: SocketAddr,
    pub origin: String,
    pub color: HsvColor,
    pub keep_alive: u128,
}

impl Session {
    pub fn new(now_time: u128, id: String, addr: SocketAddr) -> Session {
        Session {
            id,
            address: addr,
            origin: addr.to_string(),
            color: HsvColor::random_vivid(),
            keep_alive: now_time,
        }
    }
    pub fn age(&self, now_time: u128) -> u128 {
        now_time - self.keep_alive
    }
}

impl fmt::Display for Session {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{ id: {}, origin: {}, color: {} }}",
            self.id, self.origin, self.color
        )
    }
}

/// Structure to hold the sessions in the room
pub struct SessionRegistry {
    sessions: Vec<Session>,
    next_serial: u64,
}

impl SessionRegistry {
    pub fn new() -> SessionRegistry {
        SessionRegistry {
            sessions: vec![],
            next_serial: 0,
        }
    }

    /// register a connection, or refresh it if this address is already in.
    ///
    /// returns the session id assigned to the address.
    pub fn connect(&mut self, now_time: u128, addr: SocketAddr) -> String {
        if let Some(session) = self.sessions.iter_mut().find(|s| s.address == addr) {
            // a repeated hello is a keepalive, not a new identity
            session.keep_alive = now_time;
            return session.id.clone();
        }
        let id = encode_id(self.next_serial);
        self.next_serial += 1;
        let session = Session::new(now_time, id.clone(), addr);
        self.sessions.push(session);
        id
    }

    /// drop the session at this address.  returns true if one was dropped.
    pub fn disconnect(&mut self, addr: SocketAddr) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.address != addr);
        self.sessions.len() != before
    }

    /// refresh the keepalive for whoever is at this address
    pub fn touch(&mut self, now_time: u128, addr: SocketAddr) -> () {
        for session in &mut self.sessions {
            if session.address == addr && now_time > session.keep_alive {
                session.keep_alive = now_time;
            }
        }
    }

    /// age out any sessions that have gone silent.  returns true if the
    /// membership changed.
    pub fn prune(&mut self, now_time: u128) -> bool {
        let before = self.sessions.len();
        self.sessions
            .retain(|s| s.keep_alive + SESSION_EXPIRATION_IN_MICROSECONDS > now_time);
        self.sessions.len() != before
    }

    pub fn find_by_addr(&self, addr: SocketAddr) -> Option<&Session> {
        self.sessions.iter().find(|s| s.address == addr)
    }

    /// sessions to iterate for fan-out
    pub fn get_sessions(&self) -> &Vec<Session> {
        &self.sessions
    }

    /// full membership snapshot in connect order
    pub fn membership(&self) -> Vec<RosterEntry> {
        self.sessions
            .iter()
            .map(|s| RosterEntry {
                id: s.id.clone(),
                origin: s.origin.clone(),
                color: s.color,
            })
            .collect()
    }
}

impl fmt::Display for SessionRegistry {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[ ")?;
        for session in &self.sessions {
            write!(f, " {},", session)?;
        }
        write!(f, " ]")
    }
}
