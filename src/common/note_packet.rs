//! the stuff that goes on the wire between client and relay.
//!
//! Two layers here, very intentionally separate.  [`NoteMessage`] is the
//! 7-byte event payload that only the clients ever decode.  [`Frame`] is the
//! datagram envelope the relay speaks.  The relay forwards note payloads as
//! opaque bytes; it never looks inside them, so the event schema can change
//! without touching the hub.
use byteorder::{ByteOrder, LittleEndian};
use simple_error::bail;
use std::fmt;

use super::box_error::BoxError;
use super::roster::{self, RosterEntry};

/// command byte high nibble for note-on
pub const NOTE_ON: u8 = 0x90;
/// command byte high nibble for note-off
pub const NOTE_OFF: u8 = 0x80;

/// fixed payload layout: command, note, velocity, f32 LE sender time
pub const NOTE_PAYLOAD_SIZE: usize = 7;

/// one note-on/note-off occurrence.
///
/// `sender_time` is seconds on the *sender's own* session clock.  It means
/// nothing on any other machine until the receiver has estimated an offset
/// for that sender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteMessage {
    pub command: u8,
    pub note: u8,
    pub velocity: u8,
    pub sender_time: f32,
}

impl NoteMessage {
    pub fn new(command: u8, note: u8, velocity: u8, sender_time: f32) -> NoteMessage {
        NoteMessage {
            command,
            note,
            velocity,
            sender_time,
        }
    }
    /// note-on with an audible velocity
    pub fn is_begin(&self) -> bool {
        self.command & 0xf0 == NOTE_ON && self.velocity > 0
    }
    /// note-off, either encoding: a 0x80 command or a 0x90 with velocity 0
    pub fn is_end(&self) -> bool {
        match self.command & 0xf0 {
            NOTE_OFF => true,
            NOTE_ON => self.velocity == 0,
            _ => false,
        }
    }
    pub fn encode(&self) -> [u8; NOTE_PAYLOAD_SIZE] {
        let mut buf = [0u8; NOTE_PAYLOAD_SIZE];
        buf[0] = self.command;
        buf[1] = self.note;
        buf[2] = self.velocity;
        LittleEndian::write_f32(&mut buf[3..7], self.sender_time);
        buf
    }
    pub fn decode(data: &[u8]) -> Result<NoteMessage, BoxError> {
        if data.len() != NOTE_PAYLOAD_SIZE {
            bail!("note payload must be {} bytes", NOTE_PAYLOAD_SIZE);
        }
        if data[1] > 127 || data[2] > 127 {
            bail!("note or velocity out of range");
        }
        let sender_time = LittleEndian::read_f32(&data[3..7]);
        if !sender_time.is_finite() {
            bail!("non finite sender time");
        }
        Ok(NoteMessage {
            command: data[0],
            note: data[1],
            velocity: data[2],
            sender_time,
        })
    }
}

impl fmt::Display for NoteMessage {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{ cmd: {:#04x}, note: {}, vel: {}, time: {:.3} }}",
            self.command, self.note, self.velocity, self.sender_time
        )
    }
}

// datagram tags
const TAG_HELLO: u8 = 0x01;
const TAG_BYE: u8 = 0x02;
const TAG_PING: u8 = 0x03;
const TAG_PONG: u8 = 0x04;
const TAG_YOUR_ID: u8 = 0x05;
const TAG_ROSTER: u8 = 0x06;
const TAG_NOTE: u8 = 0x07;

/// one datagram on the relay link.
///
/// Note frames carry the sender id the relay stamped on them.  A client
/// sending a note upstream leaves the id empty; the relay rewrites it before
/// fanning out.  The payload stays `Vec<u8>` so the relay's type model never
/// assumes an event schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Hello,
    Bye,
    Ping,
    Pong,
    YourId(String),
    Roster(Vec<RosterEntry>),
    Note { sender_id: String, payload: Vec<u8> },
}

impl Frame {
    pub fn encode(&self) -> Result<Vec<u8>, BoxError> {
        match self {
            Frame::Hello => Ok(vec![TAG_HELLO]),
            Frame::Bye => Ok(vec![TAG_BYE]),
            Frame::Ping => Ok(vec![TAG_PING]),
            Frame::Pong => Ok(vec![TAG_PONG]),
            Frame::YourId(id) => {
                let mut buf = vec![TAG_YOUR_ID];
                buf.extend_from_slice(id.as_bytes());
                Ok(buf)
            }
            Frame::Roster(entries) => {
                let mut buf = vec![TAG_ROSTER];
                buf.extend_from_slice(&roster::to_wire(entries)?);
                Ok(buf)
            }
            Frame::Note { sender_id, payload } => {
                if sender_id.len() > 255 {
                    bail!("sender id too long");
                }
                let mut buf = Vec::with_capacity(2 + sender_id.len() + payload.len());
                buf.push(TAG_NOTE);
                buf.push(sender_id.len() as u8);
                buf.extend_from_slice(sender_id.as_bytes());
                buf.extend_from_slice(payload);
                Ok(buf)
            }
        }
    }

    pub fn decode(data: &[u8]) -> Result<Frame, BoxError> {
        if data.is_empty() {
            bail!("empty datagram");
        }
        match data[0] {
            TAG_HELLO => Ok(Frame::Hello),
            TAG_BYE => Ok(Frame::Bye),
            TAG_PING => Ok(Frame::Ping),
            TAG_PONG => Ok(Frame::Pong),
            TAG_YOUR_ID => Ok(Frame::YourId(String::from_utf8(data[1..].to_vec())?)),
            TAG_ROSTER => Ok(Frame::Roster(roster::from_wire(&data[1..])?)),
            TAG_NOTE => {
                if data.len() < 2 {
                    bail!("truncated note frame");
                }
                let id_len = data[1] as usize;
                if data.len() < 2 + id_len {
                    bail!("truncated note frame");
                }
                let sender_id = String::from_utf8(data[2..2 + id_len].to_vec())?;
                Ok(Frame::Note {
                    sender_id,
                    payload: data[2 + id_len..].to_vec(),
                })
            }
            tag => bail!("unknown frame tag {:#04x}", tag),
        }
    }
}

#[cfg(test)]
mod test_note_message {
    use super::*;

    #[test]
    fn encode_decode() {
        let msg = NoteMessage::new(0x90, 60, 100, 12.375);
        let buf = msg.encode();
        assert_eq!(buf.len(), NOTE_PAYLOAD_SIZE);
        let back = NoteMessage::decode(&buf).unwrap();
        // the timestamp must round trip exactly, not approximately
        assert_eq!(back, msg);
    }
    #[test]
    fn begin_and_end_encodings() {
        // note-on with velocity is a begin
        assert!(NoteMessage::new(0x90, 60, 100, 0.0).is_begin());
        // both note-off encodings must be honored
        assert!(NoteMessage::new(0x80, 60, 0, 0.0).is_end());
        assert!(NoteMessage::new(0x90, 60, 0, 0.0).is_end());
        // a control change is neither
        let cc = NoteMessage::new(0xb0, 7, 100, 0.0);
        assert!(!cc.is_begin());
        assert!(!cc.is_end());
    }
    #[test]
    fn channel_bits_ignored() {
        // note-on on channel 3 still counts
        assert!(NoteMessage::new(0x93, 60, 100, 0.0).is_begin());
        assert!(NoteMessage::new(0x83, 60, 0, 0.0).is_end());
    }
    #[test]
    fn decode_sanity_bounds() {
        assert!(NoteMessage::decode(&[0x90, 60, 100]).is_err());
        assert!(NoteMessage::decode(&[0x90, 200, 100, 0, 0, 0, 0]).is_err());
        assert!(NoteMessage::decode(&[0x90, 60, 200, 0, 0, 0, 0]).is_err());
        // NaN timestamp is a corrupt packet
        let mut buf = NoteMessage::new(0x90, 60, 100, 0.0).encode();
        LittleEndian::write_f32(&mut buf[3..7], f32::NAN);
        assert!(NoteMessage::decode(&buf).is_err());
    }
}
