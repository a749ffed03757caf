//! top level entry point called by main to run the client.
//!
//! [`run`] owns the socket and the timers; [`ClientEngine`] owns all the
//! session state (peer table, jitter buffer, scheduler) and is driven one
//! frame at a time.  Keeping the engine socket-free is what lets the whole
//! receive path run under test without a network.
//!
//! Everything happens on this one thread as interleaved callbacks: a frame
//! is handled to completion before the next, scheduled playback is a timer
//! drain, nothing blocks and nothing needs a lock.  Local input arrives on
//! an mpsc channel from whatever owns the input device.
use log::{debug, info, warn};
use std::sync::mpsc;

use crate::common::box_error::BoxError;
use crate::common::note_packet::{Frame, NoteMessage};
use crate::common::timekeeper::{get_micro_time, MicroTimer, SessionClock};
use crate::sound::jitter_buffer::JitterBuffer;
use crate::sound::midi_input;
use crate::sound::note_socket::NoteSocket;
use crate::sound::peer::PeerRoster;
use crate::sound::scheduler::{NoteRenderer, NoteVisual, PlaybackScheduler};

// probe the relay every 5 seconds, with one early sample so the jitter
// buffer is usefully sized before much playback happens
const PING_INTERVAL: u128 = 5_000_000;
const FIRST_PING_DELAY: u128 = 250_000;

/// all the client session state, fed by the socket loop
pub struct ClientEngine {
    my_id: Option<String>,
    roster: PeerRoster,
    jitter: JitterBuffer,
    scheduler: PlaybackScheduler,
}

impl ClientEngine {
    pub fn new() -> ClientEngine {
        ClientEngine {
            my_id: None,
            roster: PeerRoster::new(),
            jitter: JitterBuffer::build(),
            scheduler: PlaybackScheduler::build(),
        }
    }

    /// true once the relay has told us who we are.  until then no playback
    /// state exists and events are dropped rather than queued.
    pub fn is_ready(&self) -> bool {
        self.my_id.is_some()
    }

    pub fn my_id(&self) -> Option<&str> {
        self.my_id.as_deref()
    }

    pub fn jitter_secs(&self) -> f64 {
        self.jitter.get_secs()
    }

    /// a relay frame arrived at local time `now`
    pub fn handle_frame(&mut self, frame: Frame, now: f64) -> () {
        match frame {
            Frame::YourId(id) => {
                info!("session open, our id is {}", id);
                self.my_id = Some(id);
            }
            Frame::Roster(entries) => {
                self.roster.apply_snapshot(&entries);
                debug!("roster now has {} participants", self.roster.len());
            }
            Frame::Note { sender_id, payload } => {
                self.handle_remote_note(&sender_id, &payload, now);
            }
            // pongs are timed by the socket loop, which knows when the
            // ping left
            Frame::Pong => (),
            other => {
                debug!("unexpected frame: {:?}", other);
            }
        }
    }

    fn handle_remote_note(&mut self, sender_id: &str, payload: &[u8], now: f64) -> () {
        if !self.is_ready() {
            debug!("event before playback is up, dropped");
            return;
        }
        if self.my_id.as_deref() == Some(sender_id) {
            // the relay never echoes; if one shows up anyway, skip it
            debug!("own event echoed back, dropped");
            return;
        }
        let msg = match NoteMessage::decode(payload) {
            Ok(m) => m,
            Err(e) => {
                debug!("bad event payload from {}: {}", sender_id, e);
                return;
            }
        };
        // the buffer value at first-estimate time is what gets baked into
        // the offset, so read it before touching the peer
        let jitter_secs = self.jitter.get_secs();
        let peer = match self.roster.get_mut(sender_id) {
            Some(p) => p,
            None => {
                // roster update and event can race; expected, not fatal
                debug!("event from unknown sender {}, dropped", sender_id);
                return;
            }
        };
        let offset = peer.offset_if_absent(msg.sender_time as f64, now, jitter_secs);
        let css = peer.css_color.clone();
        self.scheduler.schedule(sender_id, &css, &msg, offset, now);
    }

    /// feed a measured ping round trip into the jitter buffer
    pub fn on_latency_sample(&mut self, round_trip_secs: f64) -> () {
        self.jitter.on_latency_sample(round_trip_secs);
        debug!("latency sample {:.1}ms, {}", round_trip_secs * 1000.0, self.jitter);
    }

    /// a local key went down or up.
    ///
    /// Plays at `now` on our own timeline (no offset for our own events)
    /// and returns the frame to transmit so everyone else can play it on
    /// theirs.  The relay stamps our identity on it; we send it blank.
    pub fn handle_local_input(&mut self, raw: &[u8], now: f64) -> Option<Frame> {
        let id = match &self.my_id {
            Some(id) => id.clone(),
            None => {
                debug!("local input before session is up, dropped");
                return None;
            }
        };
        let msg = midi_input::note_from_raw(raw, now)?;
        let css = match self.roster.get(&id) {
            Some(me) => me.css_color.clone(),
            None => String::new(),
        };
        self.scheduler.schedule(&id, &css, &msg, 0.0, now);
        Some(Frame::Note {
            sender_id: String::new(),
            payload: msg.encode().to_vec(),
        })
    }

    /// fire everything that has come due on the playback queue
    pub fn dispatch_due(
        &mut self,
        now: f64,
        audio: &mut dyn NoteRenderer,
        visual: &mut dyn NoteVisual,
    ) -> usize {
        self.scheduler.dispatch_due(now, audio, visual)
    }
}

/// connect to the relay and run the session.  does not return unless the
/// socket dies, which the caller surfaces as a connectivity failure.
pub fn run(
    host: &str,
    port: u32,
    input_rx: mpsc::Receiver<[u8; 3]>,
    audio: &mut dyn NoteRenderer,
    visual: &mut dyn NoteVisual,
) -> Result<(), BoxError> {
    let mut sock = NoteSocket::build()?;
    sock.connect(host, port);
    sock.send(&Frame::Hello)?;
    info!("hello sent to {}:{}", host, port);

    let clock = SessionClock::new();
    let mut engine = ClientEngine::new();
    let mut ping_timer = MicroTimer::new(get_micro_time(), FIRST_PING_DELAY);
    let mut ping_sent_at: Option<f64> = None;
    let mut buf = [0u8; 1500];

    loop {
        let now_micro = get_micro_time();

        if ping_timer.expired(now_micro) {
            ping_timer.reset(now_micro);
            ping_timer.set_interval(PING_INTERVAL);
            // overlapping probes are fine at this rate; the latest send
            // time is the one the next pong gets measured against
            ping_sent_at = Some(clock.now());
            if let Err(e) = sock.send(&Frame::Ping) {
                warn!("relay unreachable: {}", e);
            }
        }

        match sock.recv(&mut buf)? {
            Some(Frame::Pong) => {
                if let Some(sent_at) = ping_sent_at.take() {
                    engine.on_latency_sample(clock.now() - sent_at);
                }
            }
            Some(frame) => engine.handle_frame(frame, clock.now()),
            None => (),
        }

        for raw in input_rx.try_iter() {
            if let Some(frame) = engine.handle_local_input(&raw, clock.now()) {
                if let Err(e) = sock.send(&frame) {
                    warn!("event send failed: {}", e);
                }
            }
        }

        engine.dispatch_due(clock.now(), audio, visual);
    }
}
