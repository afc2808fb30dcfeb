// Background tick worker. Samples counters, folds in last-known sensor
// values, and broadcasts one rendered snapshot per tick. Also the single
// writer of configuration: overlay persistence, menu commands, and reload
// all arrive on its command channel.

use crate::aggregator::{self, CounterReadings};
use crate::config::{ConfigStore, ConfigUpdate, GridPreset};
use crate::models::{RenderedTick, SensorReadings};
use crate::overlay::{OverlayPositionState, PointerEvent, Viewport};
use crate::sampler::CounterSampler;
use crate::sensor::SensorBridge;
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

/// Rate limit for "no receivers" logging (avoid a line per tick when no
/// presenter is attached).
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Commands fed to the worker by the tray/UI surface. Pointer and lock
/// commands carry the UI viewport so grid positions can be resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentCommand {
    Reload,
    ToggleOverlay,
    ToggleLock { viewport: Viewport },
    Pointer { event: PointerEvent, viewport: Viewport },
    SetPreset(GridPreset),
    SetCoords { x: i32, y: i32 },
    SetColors { bg: String, fg: String },
    RestartSensor,
}

/// Collaborators, channels, and shutdown for the worker.
pub struct WorkerDeps {
    pub sampler: Arc<CounterSampler>,
    pub store: Arc<ConfigStore>,
    pub sensor: Arc<SensorBridge>,
    pub sensor_cache: Arc<RwLock<SensorReadings>>,
    pub tx: broadcast::Sender<RenderedTick>,
    pub cmd_rx: mpsc::Receiver<AgentCommand>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

pub fn spawn(deps: WorkerDeps) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        sampler,
        store,
        sensor,
        sensor_cache,
        tx,
        mut cmd_rx,
        mut shutdown_rx,
    } = deps;

    let worker_span = tracing::span!(tracing::Level::DEBUG, "worker");
    tokio::spawn(
        async move {
            let mut overlay = OverlayPositionState::from_config(&store.current());
            let mut tick = new_tick(&store);
            let mut last_no_receivers_warn: Option<Instant> = None;

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let rendered = run_tick(&sampler, &store, &sensor_cache).await;
                        if tx.send(rendered).is_err() {
                            let should_warn = last_no_receivers_warn
                                .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                            if should_warn {
                                tracing::debug!(
                                    operation = "broadcast_snapshot",
                                    "no presenter attached; snapshot dropped"
                                );
                                last_no_receivers_warn = Some(Instant::now());
                            }
                        }
                    }
                    command = cmd_rx.recv() => {
                        match command {
                            Some(AgentCommand::Reload) => {
                                if reload(&store, &sampler, &sensor, &mut overlay).await {
                                    tick = new_tick(&store);
                                }
                            }
                            Some(command) => {
                                handle_command(command, &store, &sensor, &mut overlay).await;
                            }
                            None => {
                                tracing::debug!("command channel closed");
                                break;
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("worker shutting down");
                        break;
                    }
                }
            }
        }
        .instrument(worker_span),
    )
}

fn new_tick(store: &ConfigStore) -> tokio::time::Interval {
    let mut tick = interval(store.current().effective_refresh());
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    tick
}

/// One sampling pass. A failed counter read leaves only that domain
/// unavailable; the tick always completes for the others.
async fn run_tick(
    sampler: &CounterSampler,
    store: &ConfigStore,
    sensor_cache: &RwLock<SensorReadings>,
) -> RenderedTick {
    let config = store.current();
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        });

    let cpu_percent = if config.show_cpu {
        sampler.read_cpu().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "read_cpu", "CPU read failed");
            None
        })
    } else {
        None
    };
    let ram = if config.show_ram {
        sampler.read_memory().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "read_memory", "memory read failed");
            None
        })
    } else {
        None
    };
    let net = if config.show_net {
        sampler.read_network().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "read_network", "network read failed");
            None
        })
    } else {
        None
    };
    let disk = if config.show_disk {
        sampler.read_disk().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "read_disk", "disk read failed");
            None
        })
    } else {
        None
    };

    let sensors = match sensor_cache.read() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    };

    let snapshot = aggregator::build_snapshot(
        timestamp,
        CounterReadings {
            cpu_percent,
            ram,
            net,
            disk,
        },
        sensors,
    );
    aggregator::render_tick(&config, snapshot)
}

/// Swap in the new configuration document. All-or-nothing: a failed reload
/// keeps the previous configuration and overlay state untouched.
/// Returns whether the tick interval must be rebuilt.
async fn reload(
    store: &ConfigStore,
    sampler: &CounterSampler,
    sensor: &SensorBridge,
    overlay: &mut OverlayPositionState,
) -> bool {
    match store.reload() {
        Ok(config) => {
            if let Err(e) = sampler.reload_selection(&config).await {
                tracing::warn!(error = %e, "interface re-selection failed");
            }
            overlay.apply_reload(&config);
            if let Err(e) = sensor.start(&config).await {
                tracing::warn!(error = %e, "sensor provider start failed after reload");
            }
            tracing::info!(path = %store.path().display(), "configuration reloaded");
            true
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %store.path().display(),
                "reload failed, previous configuration retained"
            );
            false
        }
    }
}

async fn handle_command(
    command: AgentCommand,
    store: &ConfigStore,
    sensor: &SensorBridge,
    overlay: &mut OverlayPositionState,
) {
    match command {
        AgentCommand::Reload => unreachable!("handled by the worker loop"),
        AgentCommand::ToggleOverlay => {
            let enabled = !store.current().overlay_enabled;
            persist(store, ConfigUpdate::OverlayEnabled(enabled));
        }
        AgentCommand::ToggleLock { viewport } => {
            for update in overlay.toggle_lock(&viewport) {
                persist(store, update);
            }
        }
        AgentCommand::Pointer { event, viewport } => {
            if let Some(update) = overlay.pointer(event, &viewport) {
                persist(store, update);
            }
        }
        AgentCommand::SetPreset(preset) => {
            overlay.set_preset(preset, store.current().overlay_padding);
            persist(store, ConfigUpdate::OverlayPreset(preset));
        }
        AgentCommand::SetCoords { x, y } => {
            overlay.set_coords(x, y);
            persist(store, ConfigUpdate::OverlayPosition { x, y });
        }
        AgentCommand::SetColors { bg, fg } => {
            persist(store, ConfigUpdate::OverlayColors { bg, fg });
        }
        AgentCommand::RestartSensor => {
            if let Err(e) = sensor.restart(&store.current()).await {
                tracing::warn!(error = %e, "sensor provider restart failed");
            }
        }
    }
}

fn persist(store: &ConfigStore, update: ConfigUpdate) {
    if let Err(e) = store.persist(update) {
        tracing::warn!(error = %e, "config write-back failed");
    }
}
