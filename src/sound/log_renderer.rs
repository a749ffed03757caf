//! renderer that just logs, for running the client without an audio stack.
//!
//! It keeps the active-note registry the real collaborators would keep, so
//! the scheduling contract gets exercised: a begin over a note already
//! sounding replaces it cleanly, an end for a silent note is a no-op.
use log::info;
use std::collections::HashMap;

use crate::sound::scheduler::{NoteRenderer, NoteVisual};

pub struct LogRenderer {
    // note -> velocity of the sound currently in flight
    active: HashMap<u8, u8>,
}

impl LogRenderer {
    pub fn new() -> LogRenderer {
        LogRenderer {
            active: HashMap::new(),
        }
    }
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
    pub fn is_sounding(&self, note: u8) -> bool {
        self.active.contains_key(&note)
    }
}

impl NoteRenderer for LogRenderer {
    fn begin_note(&mut self, note: u8, velocity: u8, scheduled_time: f64) {
        if self.active.insert(note, velocity).is_some() {
            // replace, don't stack
            info!("note {} retriggered at {:.3}", note, scheduled_time);
        } else {
            info!(
                "note {} on, velocity {}, at {:.3}",
                note, velocity, scheduled_time
            );
        }
    }
    fn end_note(&mut self, note: u8, scheduled_time: f64) {
        if self.active.remove(&note).is_some() {
            info!("note {} off at {:.3}", note, scheduled_time);
        }
        // off for a silent note: nothing to do, not an error
    }
}

impl NoteVisual for LogRenderer {
    fn set_visual_color(&mut self, note: u8, color: String) {
        info!("visual: note {} lit {}", note, color);
    }
    fn clear_visual(&mut self, note: u8) {
        info!("visual: note {} cleared", note);
    }
}

#[cfg(test)]
mod test_log_renderer {
    use super::*;

    #[test]
    fn begin_is_idempotent() {
        let mut r = LogRenderer::new();
        r.begin_note(60, 100, 1.0);
        r.begin_note(60, 90, 1.5);
        // the retrigger replaced the first sound instead of stacking
        assert_eq!(r.active_count(), 1);
        assert!(r.is_sounding(60));
    }
    #[test]
    fn end_without_begin_is_a_noop() {
        let mut r = LogRenderer::new();
        r.end_note(60, 1.0);
        assert_eq!(r.active_count(), 0);
    }
    #[test]
    fn begin_then_end() {
        let mut r = LogRenderer::new();
        r.begin_note(60, 100, 1.0);
        r.end_note(60, 2.0);
        assert!(!r.is_sounding(60));
    }
}
