use anyhow::Result;
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;
use traymon::config::ConfigStore;
use traymon::models::SensorReadings;
use traymon::sampler::CounterSampler;
use traymon::sensor::backend::SensorQuery;
use traymon::sensor::{self, SensorBridge};
use traymon::worker::{self, AgentCommand, WorkerDeps};
use traymon::{models, presenter};

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let config_path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.json".into());
    let store = Arc::new(ConfigStore::open(config_path));
    let config = store.current();

    let sampler = Arc::new(CounterSampler::new(&config));

    #[cfg(windows)]
    let backend: Arc<dyn SensorQuery> = Arc::new(sensor::windows::WmiQuery::new(
        config.lhm_wmi_namespace.clone(),
    ));
    #[cfg(not(windows))]
    let backend: Arc<dyn SensorQuery> = Arc::new(sensor::backend::ComponentsQuery::new());

    let sensor_bridge = Arc::new(SensorBridge::new(backend));
    if let Err(e) = sensor_bridge.start(&config).await {
        tracing::warn!(error = %e, "sensor provider start failed");
    }

    let sensor_cache = Arc::new(RwLock::new(SensorReadings::default()));
    let (tx, _) = broadcast::channel::<models::RenderedTick>(60);
    let (cmd_tx, cmd_rx) = mpsc::channel::<AgentCommand>(16);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let (poller_shutdown_tx, poller_shutdown_rx) = tokio::sync::oneshot::channel();

    let poller_handle = sensor::spawn_poller(
        sensor_bridge.clone(),
        store.clone(),
        sensor_cache.clone(),
        poller_shutdown_rx,
    );
    let worker_handle = worker::spawn(WorkerDeps {
        sampler,
        store: store.clone(),
        sensor: sensor_bridge.clone(),
        sensor_cache,
        tx: tx.clone(),
        cmd_rx,
        shutdown_rx,
    });
    let presenter_handle = presenter::spawn_console(tx.subscribe());
    tracing::info!(path = %store.path().display(), "traymon started");

    // SIGHUP reloads the configuration; Ctrl-C / SIGTERM shut down.
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sighup = signal(SignalKind::hangup())?;
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = sigterm.recv() => break,
                _ = sighup.recv() => {
                    if cmd_tx.send(AgentCommand::Reload).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
    #[cfg(not(unix))]
    {
        // No signal-driven reload here; a tray surface would own cmd_tx.
        let _ = &cmd_tx;
        tokio::signal::ctrl_c().await?;
    }

    tracing::info!("received shutdown signal");

    // Order matters: stop scheduling ticks, drain the sensor poller, then
    // terminate the provider process.
    let _ = shutdown_tx.send(());
    let _ = worker_handle.await;
    let _ = poller_shutdown_tx.send(());
    let _ = poller_handle.await;
    sensor_bridge.stop().await;

    drop(tx);
    let _ = presenter_handle.await;
    Ok(())
}
