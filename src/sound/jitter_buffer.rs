//! adaptive scheduling delay absorbing network latency variance.
//!
//! One smoothed value per client, not per peer.  Each round trip sample is
//! halved (one-way jitter is roughly half the round trip) and folded into an
//! exponential moving average.  Hard capped at one second so a single
//! pathological sample can't make the instrument feel broken for the rest
//! of the session.
use std::fmt;

const EMA_WEIGHT: f64 = 0.5;
const MAX_BUFFER_SECS: f64 = 1.0;

pub struct JitterBuffer {
    buffer_secs: f64,
    samples: usize,
}

impl JitterBuffer {
    pub fn build() -> JitterBuffer {
        JitterBuffer {
            buffer_secs: 0.0,
            samples: 0,
        }
    }

    /// fold one measured round trip into the buffer duration
    pub fn on_latency_sample(&mut self, round_trip_secs: f64) -> () {
        let one_way = round_trip_secs * 0.5;
        let mut next = one_way * EMA_WEIGHT + self.buffer_secs * (1.0 - EMA_WEIGHT);
        if next < 0.0 {
            next = 0.0;
        }
        if next > MAX_BUFFER_SECS {
            next = MAX_BUFFER_SECS;
        }
        self.buffer_secs = next;
        self.samples += 1;
    }

    /// the current buffer duration in seconds
    pub fn get_secs(&self) -> f64 {
        self.buffer_secs
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }
}

impl fmt::Display for JitterBuffer {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{ buffer: {:.3}s, samples: {} }}",
            self.buffer_secs, self.samples
        )
    }
}
