// External sensor provider lifecycle: launch the executable if present,
// probe its namespace, poll values on a dedicated task, terminate on
// shutdown with a bounded wait.

pub mod backend;
#[cfg(windows)]
pub mod windows;

use crate::config::{ConfigStore, Configuration};
use crate::models::{SENSOR_FAILURE_THRESHOLD, SensorKind, SensorReadings, SensorState};
use backend::SensorQuery;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::process::{Child, Command};

/// Startup grace before the first namespace probe.
const LAUNCH_GRACE: Duration = Duration::from_secs(1);
/// Bounded wait for the provider process to exit on stop.
const STOP_TIMEOUT: Duration = Duration::from_secs(3);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    state: SensorState,
    failures: u32,
}

impl Cell {
    fn record(&mut self, result: Result<f64, ()>) {
        match result {
            Ok(value) => {
                self.state = SensorState::Available(value);
                self.failures = 0;
            }
            Err(()) => {
                self.failures += 1;
                if self.failures >= SENSOR_FAILURE_THRESHOLD {
                    self.state = SensorState::Unavailable;
                }
                // Below the threshold the last-known state stands.
            }
        }
    }
}

#[derive(Debug, Default)]
struct Cells {
    cpu_temp: Cell,
    gpu_load: Cell,
    gpu_temp: Cell,
}

impl Cells {
    fn get_mut(&mut self, kind: SensorKind) -> &mut Cell {
        match kind {
            SensorKind::CpuTemp => &mut self.cpu_temp,
            SensorKind::GpuLoad => &mut self.gpu_load,
            SensorKind::GpuTemp => &mut self.gpu_temp,
        }
    }

    fn mark_starting(&mut self) {
        for kind in SensorKind::ALL {
            let cell = self.get_mut(kind);
            if !matches!(cell.state, SensorState::Available(_)) {
                cell.state = SensorState::Starting;
                cell.failures = 0;
            }
        }
    }

    fn readings(&self) -> SensorReadings {
        SensorReadings {
            cpu_temp: self.cpu_temp.state,
            gpu_load: self.gpu_load.state,
            gpu_temp: self.gpu_temp.state,
        }
    }
}

/// Owns the external sensor process and the per-kind value/failure state.
pub struct SensorBridge {
    backend: Arc<dyn SensorQuery>,
    child: tokio::sync::Mutex<Option<Child>>,
    connected: AtomicBool,
    cells: Mutex<Cells>,
}

impl SensorBridge {
    pub fn new(backend: Arc<dyn SensorQuery>) -> Self {
        Self {
            backend,
            child: tokio::sync::Mutex::new(None),
            connected: AtomicBool::new(false),
            cells: Mutex::new(Cells::default()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn readings(&self) -> SensorReadings {
        match self.cells.lock() {
            Ok(cells) => cells.readings(),
            Err(poisoned) => poisoned.into_inner().readings(),
        }
    }

    /// Launch the provider executable (when configured and present) and probe
    /// the sensor namespace. Idempotent: a running provider is left alone.
    /// A missing executable is not an error; sensors stay Unavailable.
    pub async fn start(&self, config: &Configuration) -> anyhow::Result<()> {
        if !config.show_temps && !config.show_gpu {
            return Ok(());
        }

        {
            let mut child_guard = self.child.lock().await;
            let running = match child_guard.as_mut() {
                Some(child) => child.try_wait()?.is_none(),
                None => false,
            };
            if running && self.is_connected() {
                return Ok(());
            }

            let exe = config.lhm_exe.trim();
            if !exe.is_empty() && !running {
                let path = Path::new(exe);
                if !path.is_file() {
                    tracing::debug!(exe, "sensor executable not found, sensors unavailable");
                    return Ok(());
                }
                let mut command = Command::new(path);
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    command.current_dir(dir);
                }
                command
                    .stdout(std::process::Stdio::null())
                    .stderr(std::process::Stdio::null())
                    .kill_on_drop(true);
                #[cfg(windows)]
                if config.lhm_run_hidden {
                    command.creation_flags(CREATE_NO_WINDOW);
                }
                match command.spawn() {
                    Ok(child) => {
                        tracing::info!(exe, "sensor provider launched");
                        *child_guard = Some(child);
                    }
                    Err(e) => {
                        // Launch failure degrades to SensorUnavailable.
                        tracing::warn!(error = %e, exe, "sensor provider launch failed");
                        return Ok(());
                    }
                }
                tokio::time::sleep(LAUNCH_GRACE).await;
            }
        }

        let backend = self.backend.clone();
        let probed = tokio::task::spawn_blocking(move || backend.probe())
            .await
            .map_err(|e| anyhow::anyhow!("sensor probe join: {}", e))?;
        match probed {
            Ok(()) => {
                self.connected.store(true, Ordering::Relaxed);
                match self.cells.lock() {
                    Ok(mut cells) => cells.mark_starting(),
                    Err(poisoned) => poisoned.into_inner().mark_starting(),
                }
                tracing::debug!("sensor namespace probe ok");
            }
            Err(e) => {
                self.connected.store(false, Ordering::Relaxed);
                tracing::debug!(error = %e, "sensor namespace probe failed");
            }
        }
        Ok(())
    }

    /// Query every enabled sensor kind once and fold the results into the
    /// per-kind state. Runs on the poller task, never on the tick driver.
    pub async fn poll_once(&self, config: &Configuration) -> SensorReadings {
        if self.is_connected() {
            for kind in SensorKind::ALL {
                if !kind_enabled(kind, config) {
                    continue;
                }
                let backend = self.backend.clone();
                let result = tokio::task::spawn_blocking(move || backend.query(kind)).await;
                let outcome = match result {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => {
                        tracing::debug!(kind = kind.as_str(), error = %e, "sensor read failed");
                        Err(())
                    }
                    Err(e) => {
                        tracing::warn!(kind = kind.as_str(), error = %e, "sensor read join failed");
                        Err(())
                    }
                };
                match self.cells.lock() {
                    Ok(mut cells) => cells.get_mut(kind).record(outcome),
                    Err(poisoned) => poisoned.into_inner().get_mut(kind).record(outcome),
                }
            }
        }
        self.readings()
    }

    /// Terminate the owned process with a bounded wait, then force-kill.
    /// Safe to call when no process was ever launched.
    pub async fn stop(&self) {
        self.connected.store(false, Ordering::Relaxed);
        let mut child_guard = self.child.lock().await;
        let Some(mut child) = child_guard.take() else {
            return;
        };
        if let Err(e) = child.start_kill() {
            tracing::debug!(error = %e, "sensor provider already exited");
            return;
        }
        match tokio::time::timeout(STOP_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(%status, "sensor provider stopped"),
            Ok(Err(e)) => tracing::warn!(error = %e, "sensor provider wait failed"),
            Err(_) => {
                tracing::warn!("sensor provider did not exit in time, killing");
                let _ = child.kill().await;
            }
        }
    }

    /// Stop, clear sensor state, and start again (tray "restart provider").
    pub async fn restart(&self, config: &Configuration) -> anyhow::Result<()> {
        self.stop().await;
        match self.cells.lock() {
            Ok(mut cells) => *cells = Cells::default(),
            Err(poisoned) => *poisoned.into_inner() = Cells::default(),
        }
        self.start(config).await
    }
}

fn kind_enabled(kind: SensorKind, config: &Configuration) -> bool {
    match kind {
        SensorKind::CpuTemp => config.show_temps && config.show_cpu_temp,
        SensorKind::GpuLoad => config.show_gpu && config.show_gpu_load,
        SensorKind::GpuTemp => config.show_gpu && config.show_temps && config.show_gpu_temp,
    }
}

/// Spawns the sensor poller: queries the provider at the tick cadence and
/// publishes last-known values for the tick driver to read without waiting.
pub fn spawn_poller(
    bridge: Arc<SensorBridge>,
    store: Arc<ConfigStore>,
    cache: Arc<RwLock<SensorReadings>>,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let config = store.current();
            tokio::select! {
                _ = tokio::time::sleep(config.effective_refresh()) => {
                    let readings = bridge.poll_once(&config).await;
                    match cache.write() {
                        Ok(mut guard) => *guard = readings,
                        Err(poisoned) => *poisoned.into_inner() = readings,
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("sensor poller shutting down");
                    break;
                }
            }
        }
    })
}
