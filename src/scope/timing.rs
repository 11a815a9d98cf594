//! Fixed-rate tick scheduling on the monotonic clock.
//!
//! Deadlines are computed as `origin + ticks * period` with the period held in
//! 32.32 fixed-point nanoseconds, so rates that do not divide a second evenly
//! (60 Hz) never drift.

use std::thread;
use std::time::{Duration, Instant};

/// Ticks of lag after which the schedule restarts from "now" instead of
/// bursting through the missed ticks.
pub const MAX_LAG_TICKS: u64 = 8;

#[derive(Debug, Clone)]
pub struct TickClock {
    origin: Instant,
    period_fp: u128,
    since_origin: u64,
    ticks: u64,
    spin_margin: Duration,
    rate_hz: f64,
}

impl TickClock {
    /// `spin_margin` is how long before a deadline the wait switches from OS
    /// sleep to yielding; zero means plain sleep.
    pub fn new(rate_hz: f64, spin_margin: Duration) -> Self {
        Self::starting_at(Instant::now(), rate_hz, spin_margin)
    }

    pub fn starting_at(origin: Instant, rate_hz: f64, spin_margin: Duration) -> Self {
        let rate_hz = rate_hz.max(1.0);
        let period_fp = (1.0e9 / rate_hz * 4_294_967_296.0) as u128;
        Self {
            origin,
            period_fp,
            since_origin: 0,
            ticks: 0,
            spin_margin,
            rate_hz,
        }
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Deadline of the `n`th tick after the current origin.
    fn deadline_after(&self, n: u64) -> Instant {
        let nanos = (u128::from(n) * self.period_fp) >> 32;
        self.origin + Duration::from_nanos(nanos.min(u128::from(u64::MAX)) as u64)
    }

    pub fn next_deadline(&self) -> Instant {
        self.deadline_after(self.since_origin + 1)
    }

    /// Blocks until the next tick's deadline.
    ///
    /// Returns `Some(lag)` when the schedule had to be resynchronised because
    /// the caller was `lag` ticks late.
    pub fn wait_next(&mut self) -> Option<u64> {
        let deadline = self.next_deadline();
        let now = Instant::now();
        self.ticks += 1;

        if now < deadline {
            wait_until(deadline, self.spin_margin);
            self.since_origin += 1;
            return None;
        }

        let period_ns = (self.period_fp >> 32).max(1);
        let lag = ((now - deadline).as_nanos() / period_ns) as u64;
        if lag >= MAX_LAG_TICKS {
            self.origin = now;
            self.since_origin = 0;
            return Some(lag);
        }

        self.since_origin += 1;
        None
    }
}

/// Sleeps until `deadline`, finishing the last `spin_margin` by yielding.
pub fn wait_until(deadline: Instant, spin_margin: Duration) {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        let remaining = deadline - now;
        if remaining > spin_margin {
            thread::sleep(remaining - spin_margin);
        } else {
            thread::yield_now();
        }
    }
}
