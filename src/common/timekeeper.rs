//! time sources used by the relay and client loops.
//!
//! Two different clocks on purpose.  `get_micro_time` is wall time used for
//! keepalive bookkeeping where absolute values never cross machines.
//! [`SessionClock`] is the local playback timeline: a monotonic f64 seconds
//! count that event timestamps are expressed in.  Timestamps from one
//! SessionClock are only ever compared with timestamps from the same one.
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// microseconds since the unix epoch
pub fn get_micro_time() -> u128 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_micros(),
        Err(_) => 0, // clock before 1970, not worth dying over
    }
}

/// monotonic local playback timeline in seconds
///
/// starts at zero when built.  This is the clock note events get stamped
/// with on the way out, and the clock the scheduler fires against.
pub struct SessionClock {
    epoch: Instant,
}

impl SessionClock {
    pub fn new() -> SessionClock {
        SessionClock {
            epoch: Instant::now(),
        }
    }
    /// seconds since this clock was built
    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// interval timer in microseconds for polling loops
pub struct MicroTimer {
    last_time: u128,
    interval: u128,
}

impl MicroTimer {
    pub fn new(now: u128, interval: u128) -> MicroTimer {
        MicroTimer {
            last_time: now,
            interval,
        }
    }
    pub fn set_interval(&mut self, interval: u128) -> () {
        self.interval = interval;
    }
    pub fn expired(&self, now: u128) -> bool {
        (self.last_time + self.interval) < now
    }
    pub fn reset(&mut self, now: u128) {
        self.last_time = now;
    }
    pub fn since(&self, now: u128) -> u128 {
        now - self.last_time
    }
}

#[cfg(test)]
mod test_timekeeper {
    use super::*;

    #[test]
    fn micro_time() {
        // it should be well past 2020 by now
        assert!(get_micro_time() > 1_577_000_000_000_000);
    }
    #[test]
    fn session_clock_advances() {
        let clock = SessionClock::new();
        let t1 = clock.now();
        let t2 = clock.now();
        assert!(t2 >= t1);
        assert!(t1 >= 0.0);
    }
    #[test]
    fn timer_expiration() {
        let mut now = 1000;
        let mut mt = MicroTimer::new(now, 100);
        assert!(!mt.expired(now));
        now += 99;
        assert!(!mt.expired(now));
        now += 2;
        assert!(mt.expired(now));
        mt.reset(now);
        assert!(!mt.expired(now));
        assert_eq!(mt.since(now + 10), 10);
        mt.set_interval(9);
        now += 10;
        assert!(mt.expired(now));
    }
}
