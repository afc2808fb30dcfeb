// Domain models (ported from the original tray monitor)

mod metrics;
mod sensor;

pub use metrics::{DiskRate, NetRate, RamUsage, RenderedTick, Snapshot};
pub use sensor::{SENSOR_FAILURE_THRESHOLD, SensorKind, SensorReadings, SensorState};
