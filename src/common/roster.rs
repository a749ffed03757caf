//! membership snapshot sent by the relay on every connect or disconnect.
//!
//! Always the full list, never a delta.  That costs O(n) per membership
//! change but a client that misses one snapshot is healed by the next.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::box_error::BoxError;
use crate::common::color::HsvColor;

/// one participant as the relay sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub origin: String,
    pub color: HsvColor,
}

/// serialize a snapshot for the roster frame
pub fn to_wire(entries: &[RosterEntry]) -> Result<Vec<u8>, BoxError> {
    Ok(serde_json::to_vec(entries)?)
}

/// parse a snapshot out of a roster frame payload
pub fn from_wire(data: &[u8]) -> Result<Vec<RosterEntry>, BoxError> {
    Ok(serde_json::from_slice(data)?)
}

impl fmt::Display for RosterEntry {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{ id: {}, origin: {}, color: {} }}",
            self.id, self.origin, self.color
        )
    }
}

#[cfg(test)]
mod test_roster {
    use super::*;

    fn entry(id: &str) -> RosterEntry {
        RosterEntry {
            id: id.to_string(),
            origin: "10.0.0.1:9000".to_string(),
            color: HsvColor {
                h: 42.0,
                s: 0.9,
                v: 0.95,
            },
        }
    }

    #[test]
    fn wire_round_trip() {
        let snapshot = vec![entry("A"), entry("B")];
        let bytes = to_wire(&snapshot).unwrap();
        let back = from_wire(&bytes).unwrap();
        assert_eq!(back, snapshot);
    }
    #[test]
    fn empty_snapshot() {
        // an empty room is a legal snapshot
        let bytes = to_wire(&[]).unwrap();
        assert_eq!(from_wire(&bytes).unwrap().len(), 0);
    }
    #[test]
    fn garbage_is_an_error() {
        assert!(from_wire(b"not json at all").is_err());
    }
}
