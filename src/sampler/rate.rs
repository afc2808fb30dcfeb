// Rate derivation from cumulative counters. One previous sample per domain;
// deltas are saturating so a counter reset/wraparound reads as 0, never
// negative. A previous sample older than the staleness bound forces a
// re-baseline and the tick reports unavailable.

use crate::config::MIN_REFRESH_SECS;
use crate::models::NetRate;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How much older than the tick interval a previous sample may be before the
/// delta is discarded. Factor 2 tolerates timer jitter and skipped ticks.
const STALE_FACTOR: u32 = 2;

fn stale_after(interval: Duration) -> Duration {
    interval.max(Duration::from_secs_f64(MIN_REFRESH_SECS)) * STALE_FACTOR
}

fn rate(delta: u64, dt: Duration) -> f64 {
    // dt floored to the minimum tick to avoid divide-by-near-zero.
    delta as f64 / dt.as_secs_f64().max(MIN_REFRESH_SECS)
}

/// Tracker for one (read, write)-style cumulative counter pair.
#[derive(Debug)]
pub struct PairWindow {
    interval: Duration,
    last: Option<(Instant, u64, u64)>,
}

impl PairWindow {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Feed the current cumulative pair; returns per-second rates, or `None`
    /// on the baseline tick and after a stale gap.
    pub fn advance(&mut self, now: Instant, a: u64, b: u64) -> Option<(f64, f64)> {
        let prev = self.last.replace((now, a, b));
        let (t0, a0, b0) = prev?;
        let dt = now.duration_since(t0);
        if dt > stale_after(self.interval) {
            return None;
        }
        Some((rate(a.saturating_sub(a0), dt), rate(b.saturating_sub(b0), dt)))
    }
}

/// Tracker for a set of per-interface (sent, received) cumulative counters.
/// Interfaces without a previous sample (newly appeared, or just selected)
/// are skipped for one tick and join on the next.
#[derive(Debug)]
pub struct MultiWindow {
    interval: Duration,
    last: Option<(Instant, HashMap<String, (u64, u64)>)>,
}

impl MultiWindow {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Feed cumulative (sent, received) counters in selection order; returns
    /// rates in the same order, or `None` on the baseline tick.
    pub fn advance(
        &mut self,
        now: Instant,
        current: &[(String, (u64, u64))],
    ) -> Option<Vec<(String, NetRate)>> {
        let snapshot: HashMap<String, (u64, u64)> =
            current.iter().map(|(n, v)| (n.clone(), *v)).collect();
        let prev = self.last.replace((now, snapshot));
        let (t0, prev_map) = prev?;
        let dt = now.duration_since(t0);
        if dt > stale_after(self.interval) {
            return None;
        }
        let rates = current
            .iter()
            .filter_map(|(name, (sent, recv))| {
                let (sent0, recv0) = prev_map.get(name)?;
                Some((
                    name.clone(),
                    NetRate {
                        up_bps: rate(sent.saturating_sub(*sent0), dt),
                        down_bps: rate(recv.saturating_sub(*recv0), dt),
                    },
                ))
            })
            .collect();
        Some(rates)
    }
}
