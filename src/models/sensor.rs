// Sensor value states. A single failed read keeps the last Available value;
// only SENSOR_FAILURE_THRESHOLD consecutive failures downgrade to Unavailable.

/// Consecutive failed reads before an Available sensor degrades.
pub const SENSOR_FAILURE_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    CpuTemp,
    GpuLoad,
    GpuTemp,
}

impl SensorKind {
    pub const ALL: [SensorKind; 3] = [SensorKind::CpuTemp, SensorKind::GpuLoad, SensorKind::GpuTemp];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::CpuTemp => "cpu-temp",
            SensorKind::GpuLoad => "gpu-load",
            SensorKind::GpuTemp => "gpu-temp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SensorState {
    /// No provider, or the failure threshold was crossed.
    #[default]
    Unavailable,
    /// Provider started but no successful read yet.
    Starting,
    Available(f64),
}

impl SensorState {
    pub fn value(&self) -> Option<f64> {
        match self {
            SensorState::Available(v) => Some(*v),
            _ => None,
        }
    }
}

/// Last-known value per sensor kind, published by the sensor poller and read
/// by the tick without blocking.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorReadings {
    pub cpu_temp: SensorState,
    pub gpu_load: SensorState,
    pub gpu_temp: SensorState,
}

impl SensorReadings {
    pub fn get(&self, kind: SensorKind) -> SensorState {
        match kind {
            SensorKind::CpuTemp => self.cpu_temp,
            SensorKind::GpuLoad => self.gpu_load,
            SensorKind::GpuTemp => self.gpu_temp,
        }
    }

    pub fn set(&mut self, kind: SensorKind, state: SensorState) {
        match kind {
            SensorKind::CpuTemp => self.cpu_temp = state,
            SensorKind::GpuLoad => self.gpu_load = state,
            SensorKind::GpuTemp => self.gpu_temp = state,
        }
    }
}
