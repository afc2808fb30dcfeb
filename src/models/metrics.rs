// Per-tick metric values. A snapshot is immutable once produced and
// superseded on the next tick; absent domains render as "n/a".

use super::SensorReadings;

/// Send/receive rate pair for one interface or an aggregate, in bytes/sec.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NetRate {
    pub up_bps: f64,
    pub down_bps: f64,
}

impl NetRate {
    pub fn sum(rates: impl IntoIterator<Item = NetRate>) -> NetRate {
        rates.into_iter().fold(NetRate::default(), |acc, r| NetRate {
            up_bps: acc.up_bps + r.up_bps,
            down_bps: acc.down_bps + r.down_bps,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskRate {
    pub read_bps: f64,
    pub write_bps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RamUsage {
    pub used: u64,
    pub total: u64,
}

/// One tick's worth of metrics. `None` means the domain was hidden by a
/// show-flag or its counter read failed/was re-baselined this tick.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub cpu_percent: Option<f64>,
    pub ram: Option<RamUsage>,
    /// Per-interface rates in the configured selection order. Empty when the
    /// network domain is unavailable this tick.
    pub net_per_iface: Vec<(String, NetRate)>,
    pub disk: Option<DiskRate>,
    pub sensors: SensorReadings,
}

/// Aggregator output broadcast to presenters each tick.
#[derive(Debug, Clone)]
pub struct RenderedTick {
    pub snapshot: Snapshot,
    /// Rendered format template truncated to `tooltip_lines`.
    pub tooltip: String,
    /// Rendered format template, separate-mode net lines joined inline.
    pub overlay: String,
}
