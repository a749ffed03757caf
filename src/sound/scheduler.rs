//! deferred playback of note events at their computed local time.
//!
//! Incoming events become entries in a min-ordered queue keyed by scheduled
//! time.  The loop calls [`PlaybackScheduler::dispatch_due`] every tick and
//! the due entries fire into the renderer seams.  Nothing here blocks.
//!
//! Clamp policy for a remote event at `sender_time + offset`:
//! - more than 10 seconds out: a misbehaving sender or corrupt timestamp.
//!   Dropped with a log line, the performance continues.
//! - in the past: late delivery.  Clamped to now and played; dropping notes
//!   is worse for the music than playing one late.
//!
//! Every entry carries a cancellation token.  A scheduled end for a note
//! cancels any queued begin for the same note and sender that would fire
//! after it, so a stop can no longer lose the race against a deferred begin
//! and leave the note hanging.
use log::{debug, warn};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use crate::common::note_packet::NoteMessage;

/// events scheduled further out than this are protocol anomalies
pub const MAX_FUTURE_SECS: f64 = 10.0;

/// the audio collaborator.  implemented outside the core.
#[cfg_attr(test, mockall::automock)]
pub trait NoteRenderer {
    fn begin_note(&mut self, note: u8, velocity: u8, scheduled_time: f64);
    fn end_note(&mut self, note: u8, scheduled_time: f64);
}

/// the visual collaborator.  implemented outside the core.
#[cfg_attr(test, mockall::automock)]
pub trait NoteVisual {
    fn set_visual_color(&mut self, note: u8, color: String);
    fn clear_visual(&mut self, note: u8);
}

#[derive(Debug, Clone, PartialEq)]
enum NoteAction {
    Begin { velocity: u8, color: String },
    End,
}

#[derive(Debug)]
struct Entry {
    fire_at: f64,
    token: u64,
    sender: String,
    note: u8,
    action: NoteAction,
}

// ordering is by time, then by insertion so equal-time entries fire in
// arrival order (a begin clamped to now fires before the end clamped to now)
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .total_cmp(&other.fire_at)
            .then(self.token.cmp(&other.token))
    }
}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}
impl Eq for Entry {}

pub struct PlaybackScheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    cancelled: HashSet<u64>,
    next_token: u64,
}

impl PlaybackScheduler {
    pub fn build() -> PlaybackScheduler {
        PlaybackScheduler {
            queue: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_token: 0,
        }
    }

    /// queue a note event for playback.
    ///
    /// `offset` is the sender's established clock offset (zero for local
    /// events stamped with our own clock).  Returns the absolute local time
    /// the event will fire at, or None if it was dropped.
    pub fn schedule(
        &mut self,
        sender_id: &str,
        color: &str,
        msg: &NoteMessage,
        offset: f64,
        now: f64,
    ) -> Option<f64> {
        let mut fire_at = msg.sender_time as f64 + offset;
        if fire_at > now + MAX_FUTURE_SECS {
            warn!(
                "dropping event from {} scheduled {:.3}s in the future",
                sender_id,
                fire_at - now
            );
            return None;
        }
        if fire_at < now {
            debug!(
                "late event from {}, clamping {:.3}s forward",
                sender_id,
                now - fire_at
            );
            fire_at = now;
        }
        if msg.is_begin() {
            self.push(fire_at, sender_id, msg.note, NoteAction::Begin {
                velocity: msg.velocity,
                color: color.to_string(),
            });
        } else if msg.is_end() {
            self.cancel_pending_begins(sender_id, msg.note, fire_at);
            self.push(fire_at, sender_id, msg.note, NoteAction::End);
        } else {
            debug!("ignoring non note command {:#04x}", msg.command);
            return None;
        }
        Some(fire_at)
    }

    fn push(&mut self, fire_at: f64, sender: &str, note: u8, action: NoteAction) -> () {
        let token = self.next_token;
        self.next_token += 1;
        self.queue.push(Reverse(Entry {
            fire_at,
            token,
            sender: sender.to_string(),
            note,
            action,
        }));
    }

    /// cancel queued begins for this sender and note that would fire after
    /// `when`.  those are the ones an end must not lose a race to.
    fn cancel_pending_begins(&mut self, sender: &str, note: u8, when: f64) -> () {
        for Reverse(entry) in self.queue.iter() {
            if entry.note == note
                && entry.sender == sender
                && entry.fire_at > when
                && matches!(entry.action, NoteAction::Begin { .. })
            {
                debug!("cancelling begin for note {} overtaken by its end", note);
                self.cancelled.insert(entry.token);
            }
        }
    }

    /// fire everything that has come due.  returns how many entries fired.
    pub fn dispatch_due(
        &mut self,
        now: f64,
        audio: &mut dyn NoteRenderer,
        visual: &mut dyn NoteVisual,
    ) -> usize {
        let mut fired = 0;
        while let Some(Reverse(head)) = self.queue.peek() {
            if head.fire_at > now {
                break;
            }
            let entry = match self.queue.pop() {
                Some(Reverse(e)) => e,
                None => break,
            };
            if self.cancelled.remove(&entry.token) {
                continue;
            }
            match entry.action {
                NoteAction::Begin { velocity, color } => {
                    audio.begin_note(entry.note, velocity, entry.fire_at);
                    visual.set_visual_color(entry.note, color);
                }
                NoteAction::End => {
                    audio.end_note(entry.note, entry.fire_at);
                    visual.clear_visual(entry.note);
                }
            }
            fired += 1;
        }
        fired
    }

    pub fn pending(&self) -> usize {
        self.queue.len() - self.cancelled.len()
    }
}
