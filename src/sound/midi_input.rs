//! turn raw MIDI bytes from a local device into note events.
//!
//! Device enumeration lives outside the core; whatever owns the device just
//! hands us the 3 byte messages.  Anything that is not a note on or off is
//! discarded here.
use wmidi::MidiMessage;

use crate::common::note_packet::{NoteMessage, NOTE_OFF, NOTE_ON};

/// parse a raw MIDI message, stamping it with the local clock reading.
///
/// returns None for anything that is not a note event.
pub fn note_from_raw(bytes: &[u8], local_time: f64) -> Option<NoteMessage> {
    match MidiMessage::try_from(bytes) {
        Ok(MidiMessage::NoteOn(_channel, note, velocity)) => Some(NoteMessage::new(
            NOTE_ON,
            note as u8,
            u8::from(velocity),
            local_time as f32,
        )),
        Ok(MidiMessage::NoteOff(_channel, note, _velocity)) => Some(NoteMessage::new(
            NOTE_OFF,
            note as u8,
            0,
            local_time as f32,
        )),
        Ok(_) => None,
        Err(e) => {
            log::debug!("unparseable midi input: {}", e);
            None
        }
    }
}
