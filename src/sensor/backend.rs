// Sensor query backends. The bridge only sees this trait, so tests can
// substitute a canned implementation.

use crate::models::SensorKind;
use std::sync::Mutex;
use sysinfo::Components;

pub trait SensorQuery: Send + Sync {
    /// Cheap connectivity check; called once after the provider starts.
    fn probe(&self) -> anyhow::Result<()>;
    fn query(&self, kind: SensorKind) -> anyhow::Result<f64>;
}

const CPU_LABELS: [&str; 5] = ["cpu", "coretemp", "k10temp", "package", "tctl"];
const GPU_LABELS: [&str; 3] = ["gpu", "amdgpu", "nouveau"];

/// Hardware sensors exposed by the OS (hwmon and friends) via sysinfo.
/// GPU load is not part of that surface and always reads as unavailable.
pub struct ComponentsQuery {
    components: Mutex<Components>,
}

impl ComponentsQuery {
    pub fn new() -> Self {
        Self {
            components: Mutex::new(Components::new_with_refreshed_list()),
        }
    }

    fn max_temp(&self, labels: &[&str]) -> anyhow::Result<f64> {
        let mut components = self
            .components
            .lock()
            .map_err(|e| anyhow::anyhow!("components lock poisoned: {}", e))?;
        components.refresh(true);
        components
            .list()
            .iter()
            .filter(|c| {
                let label = c.label().to_lowercase();
                labels.iter().any(|l| label.contains(l))
            })
            .filter_map(|c| c.temperature())
            .map(f64::from)
            .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))))
            .ok_or_else(|| anyhow::anyhow!("no matching temperature sensor"))
    }
}

impl Default for ComponentsQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorQuery for ComponentsQuery {
    fn probe(&self) -> anyhow::Result<()> {
        let mut components = self
            .components
            .lock()
            .map_err(|e| anyhow::anyhow!("components lock poisoned: {}", e))?;
        components.refresh(true);
        if components.list().is_empty() {
            anyhow::bail!("no hardware sensors exposed");
        }
        Ok(())
    }

    fn query(&self, kind: SensorKind) -> anyhow::Result<f64> {
        match kind {
            SensorKind::CpuTemp => self.max_temp(&CPU_LABELS),
            SensorKind::GpuTemp => self.max_temp(&GPU_LABELS),
            SensorKind::GpuLoad => anyhow::bail!("gpu load not exposed by hardware sensors"),
        }
    }
}
