// LibreHardwareMonitor sensors via its WMI namespace (Windows only).

use super::backend::SensorQuery;
use crate::models::SensorKind;
use serde::Deserialize;
use wmi::{COMLibrary, WMIConnection};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WmiSensor {
    name: Option<String>,
    sensor_type: Option<String>,
    value: Option<f32>,
}

/// Queries the configured management-instrumentation namespace. A connection
/// is COM-apartment bound, so one is established per query; queries run on
/// blocking worker threads.
pub struct WmiQuery {
    namespace: String,
}

impl WmiQuery {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    fn sensors(&self) -> anyhow::Result<Vec<WmiSensor>> {
        let com = COMLibrary::new()?;
        let conn = WMIConnection::with_namespace_path(&self.namespace, com)?;
        Ok(conn.raw_query("SELECT Name, SensorType, Value FROM Sensor")?)
    }

    fn max_value(
        sensors: &[WmiSensor],
        sensor_type: &str,
        name_contains: &[&str],
    ) -> Option<f64> {
        sensors
            .iter()
            .filter(|s| s.sensor_type.as_deref() == Some(sensor_type))
            .filter(|s| {
                let name = s.name.as_deref().unwrap_or_default().to_lowercase();
                name_contains.iter().all(|frag| name.contains(frag))
            })
            .filter_map(|s| s.value)
            .map(f64::from)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

impl SensorQuery for WmiQuery {
    fn probe(&self) -> anyhow::Result<()> {
        self.sensors().map(|_| ())
    }

    fn query(&self, kind: SensorKind) -> anyhow::Result<f64> {
        let sensors = self.sensors()?;
        let value = match kind {
            SensorKind::CpuTemp => Self::max_value(&sensors, "Temperature", &["cpu"]),
            SensorKind::GpuLoad => Self::max_value(&sensors, "Load", &["gpu", "core"]),
            SensorKind::GpuTemp => Self::max_value(&sensors, "Temperature", &["gpu"]),
        };
        value.ok_or_else(|| anyhow::anyhow!("no {} sensor in namespace", kind.as_str()))
    }
}
