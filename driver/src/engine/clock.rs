//! Host clock and the zero-time-stamp anchor

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of host time
pub trait HostClock: Send + Sync {
    /// Current host time in ticks
    fn now(&self) -> u64;

    fn ticks_per_second(&self) -> f64;
}

/// Nanoseconds since construction
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for MonotonicClock {
    fn now(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn ticks_per_second(&self) -> f64 {
        1.0e9
    }
}

/// Clock that only moves when told to, for offline rendering and tests
#[derive(Debug)]
pub struct ManualClock {
    ticks: AtomicU64,
    ticks_per_second: f64,
}

impl ManualClock {
    pub fn new(ticks_per_second: f64) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            ticks_per_second,
        }
    }

    pub fn set(&self, ticks: u64) {
        self.ticks.store(ticks, Ordering::SeqCst);
    }

    pub fn advance(&self, ticks: u64) {
        self.ticks.fetch_add(ticks, Ordering::SeqCst);
    }
}

impl HostClock for ManualClock {
    fn now(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }
}

/// Sample time paired with the host time at which it occurs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeStamp {
    pub sample_time: f64,
    pub host_time: u64,
    pub seed: u64,
}

/// Period-boundary bookkeeping behind the zero-time-stamp query
///
/// Sample time advances in whole periods; the reported pair is always the
/// boundary of the current period, so it never moves backwards.
#[derive(Debug, Clone)]
pub struct ZeroTimeStampAnchor {
    host_time: u64,
    host_ticks_per_frame: f64,
    periods: u64,
    period_frames: u64,
}

impl ZeroTimeStampAnchor {
    /// Seed reported with every time stamp; discontinuities are not tracked
    pub const SEED: u64 = 1;

    pub fn new(period_frames: u32, host_ticks_per_frame: f64) -> Self {
        Self {
            host_time: 0,
            host_ticks_per_frame,
            periods: 0,
            period_frames: u64::from(period_frames),
        }
    }

    /// Restart counting from period zero at `now`
    pub fn reset(&mut self, now: u64) {
        self.host_time = now;
        self.periods = 0;
    }

    pub fn host_ticks_per_frame(&self) -> f64 {
        self.host_ticks_per_frame
    }

    pub fn set_host_ticks_per_frame(&mut self, ticks: f64) {
        self.host_ticks_per_frame = ticks;
    }

    fn ticks_per_period(&self) -> f64 {
        self.host_ticks_per_frame * self.period_frames as f64
    }

    /// Step past the next boundary if `now` has reached it and report the
    /// current one
    pub fn advance(&mut self, now: u64) -> TimeStamp {
        let ticks_per_period = self.ticks_per_period();
        let next_boundary = self.host_time as f64 + (self.periods + 1) as f64 * ticks_per_period;
        if next_boundary <= now as f64 {
            self.periods += 1;
        }

        TimeStamp {
            sample_time: (self.periods * self.period_frames) as f64,
            host_time: self.host_time + (self.periods as f64 * ticks_per_period) as u64,
            seed: Self::SEED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1000.0);
        clock.set(10);
        clock.advance(5);
        assert_eq!(clock.now(), 15);
        assert_eq!(clock.ticks_per_second(), 1000.0);
    }

    #[test]
    fn test_monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_anchor_stays_on_boundary() {
        // 2 ticks per frame, 4 frames per period: a period is 8 ticks
        let mut anchor = ZeroTimeStampAnchor::new(4, 2.0);
        anchor.reset(100);

        let ts = anchor.advance(105);
        assert_eq!((ts.sample_time, ts.host_time), (0.0, 100));

        let ts = anchor.advance(108);
        assert_eq!((ts.sample_time, ts.host_time), (4.0, 108));

        let ts = anchor.advance(115);
        assert_eq!((ts.sample_time, ts.host_time), (4.0, 108));
        assert_eq!(ts.seed, ZeroTimeStampAnchor::SEED);
    }

    #[test]
    fn test_anchor_advances_one_period_per_query() {
        let mut anchor = ZeroTimeStampAnchor::new(4, 2.0);
        anchor.reset(0);

        let ts = anchor.advance(1_000);
        assert_eq!(ts.sample_time, 4.0);
        let ts = anchor.advance(1_000);
        assert_eq!(ts.sample_time, 8.0);
    }

    proptest! {
        #[test]
        fn anchor_is_monotonic(steps in proptest::collection::vec(0u64..5_000, 1..64)) {
            let mut anchor = ZeroTimeStampAnchor::new(512, 20_833.333);
            anchor.reset(7);
            let mut now = 7u64;
            let mut prev = anchor.advance(now);

            for step in steps {
                now += step * 1_000;
                let ts = anchor.advance(now);
                prop_assert!(ts.sample_time >= prev.sample_time);
                prop_assert!(ts.host_time >= prev.host_time);
                prop_assert_eq!(ts.sample_time % 512.0, 0.0);
                prev = ts;
            }
        }
    }
}
