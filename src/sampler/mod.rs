// Counter sampling via sysinfo. Cumulative OS counters stay behind this
// module; the rest of the agent only ever sees per-second rates and gauges.

mod linux;
pub mod rate;
pub mod select;

use crate::config::Configuration;
use crate::models::{DiskRate, NetRate, RamUsage};
use rate::{MultiWindow, PairWindow};
use select::{IfaceInfo, NicSelector};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use sysinfo::{Disks, Networks, System};
use tracing::instrument;

struct CpuWindow {
    last: Option<(Instant, Option<f64>)>,
}

pub struct CounterSampler {
    sys: Arc<Mutex<System>>,
    networks: Arc<Mutex<Networks>>,
    disks: Arc<Mutex<Disks>>,
    cpu: Arc<Mutex<CpuWindow>>,
    net: Arc<Mutex<(NicSelector, MultiWindow)>>,
    disk: Arc<Mutex<PairWindow>>,
}

fn interface_infos(networks: &Networks) -> Vec<IfaceInfo> {
    networks
        .list()
        .iter()
        .map(|(name, data)| IfaceInfo {
            name: name.clone(),
            total_bytes: data.total_transmitted().saturating_add(data.total_received()),
            is_up: linux::interface_is_up(name),
        })
        .collect()
}

impl CounterSampler {
    /// Initial counter refresh plus the startup interface selection.
    pub fn new(config: &Configuration) -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let networks = Networks::new_with_refreshed_list();
        let disks = Disks::new_with_refreshed_list();

        let interval = config.effective_refresh();
        let selector = NicSelector::resolve(config, &interface_infos(&networks));

        Self {
            sys: Arc::new(Mutex::new(sys)),
            networks: Arc::new(Mutex::new(networks)),
            disks: Arc::new(Mutex::new(disks)),
            cpu: Arc::new(Mutex::new(CpuWindow { last: None })),
            net: Arc::new(Mutex::new((selector, MultiWindow::new(interval)))),
            disk: Arc::new(Mutex::new(PairWindow::new(interval))),
        }
    }

    /// Re-resolve the interface selection and re-baseline rate state.
    /// Called once at startup (via `new`) and once per config reload.
    #[instrument(skip(self, config), fields(repo = "sampler", operation = "reload_selection"))]
    pub async fn reload_selection(&self, config: &Configuration) -> anyhow::Result<()> {
        let networks = self.networks.clone();
        let net = self.net.clone();
        let disk = self.disk.clone();
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            let mut networks_guard = networks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
            networks_guard.refresh(true);
            let infos = interface_infos(&networks_guard);

            let interval = config.effective_refresh();
            let mut net_guard = net
                .lock()
                .map_err(|e| anyhow::anyhow!("net state lock poisoned: {}", e))?;
            net_guard.0 = NicSelector::resolve(&config, &infos);
            net_guard.1.set_interval(interval);
            net_guard.1.reset();

            let mut disk_guard = disk
                .lock()
                .map_err(|e| anyhow::anyhow!("disk state lock poisoned: {}", e))?;
            disk_guard.set_interval(interval);
            disk_guard.reset();
            Ok(())
        })
        .await
        .map_err(|e| anyhow::anyhow!("sampler task join: {}", e))?
    }

    /// Global CPU busy fraction in percent. The first tick establishes the
    /// baseline and reports unavailable.
    #[instrument(skip(self), fields(repo = "sampler", operation = "read_cpu"))]
    pub async fn read_cpu(&self) -> anyhow::Result<Option<f64>> {
        let sys = self.sys.clone();
        let cpu = self.cpu.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            let mut window = cpu
                .lock()
                .map_err(|e| anyhow::anyhow!("cpu state lock poisoned: {}", e))?;

            let now = Instant::now();
            match window.last {
                None => {
                    sys.refresh_cpu_all();
                    window.last = Some((now, None));
                    Ok(None)
                }
                Some((prev_ts, prev_usage)) => {
                    if now.duration_since(prev_ts) >= sysinfo::MINIMUM_CPU_UPDATE_INTERVAL {
                        sys.refresh_cpu_all();
                        let usage = (sys.global_cpu_usage() as f64).clamp(0.0, 100.0);
                        window.last = Some((now, Some(usage)));
                        Ok(Some(usage))
                    } else {
                        // Too soon for a meaningful delta; keep the cached value.
                        Ok(prev_usage)
                    }
                }
            }
        })
        .await
        .map_err(|e| anyhow::anyhow!("sampler task join: {}", e))?
    }

    #[instrument(skip(self), fields(repo = "sampler", operation = "read_memory"))]
    pub async fn read_memory(&self) -> anyhow::Result<Option<RamUsage>> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_memory();
            let total = sys.total_memory();
            if total == 0 {
                return Ok(None);
            }
            let used = total.saturating_sub(sys.available_memory());
            Ok(Some(RamUsage { used, total }))
        })
        .await
        .map_err(|e| anyhow::anyhow!("sampler task join: {}", e))?
    }

    /// Per-interface send/receive rates for the current selection, in
    /// selection order. `None` while no rate can be derived (baseline tick,
    /// stale gap, or no selectable interface).
    #[instrument(skip(self), fields(repo = "sampler", operation = "read_network"))]
    pub async fn read_network(&self) -> anyhow::Result<Option<Vec<(String, NetRate)>>> {
        let networks = self.networks.clone();
        let net = self.net.clone();
        tokio::task::spawn_blocking(move || {
            let mut networks_guard = networks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
            networks_guard.refresh(true);
            let infos = interface_infos(&networks_guard);

            let mut net_guard = net
                .lock()
                .map_err(|e| anyhow::anyhow!("net state lock poisoned: {}", e))?;
            let (selector, window) = &mut *net_guard;

            // A vanished interface drops out of `current`; its rate is simply
            // unavailable this tick rather than failing the domain.
            let current: Vec<(String, (u64, u64))> = selector
                .selected(&infos)
                .into_iter()
                .filter_map(|name| {
                    let data = networks_guard.list().get(&name)?;
                    Some((name, (data.total_transmitted(), data.total_received())))
                })
                .collect();
            if current.is_empty() {
                window.reset();
                return Ok(None);
            }

            let now = Instant::now();
            Ok(window.advance(now, &current).filter(|r| !r.is_empty()))
        })
        .await
        .map_err(|e| anyhow::anyhow!("sampler task join: {}", e))?
    }

    /// Whole-host disk read/write rates from the per-disk cumulative totals.
    #[instrument(skip(self), fields(repo = "sampler", operation = "read_disk"))]
    pub async fn read_disk(&self) -> anyhow::Result<Option<DiskRate>> {
        let disks = self.disks.clone();
        let disk = self.disk.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks_guard = disks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo disks lock poisoned: {}", e))?;
            disks_guard.refresh(true);

            let mut read_total: u64 = 0;
            let mut write_total: u64 = 0;
            for d in disks_guard.list() {
                let usage = d.usage();
                read_total = read_total.saturating_add(usage.total_read_bytes);
                write_total = write_total.saturating_add(usage.total_written_bytes);
            }

            let mut window = disk
                .lock()
                .map_err(|e| anyhow::anyhow!("disk state lock poisoned: {}", e))?;
            let now = Instant::now();
            Ok(window
                .advance(now, read_total, write_total)
                .map(|(read_bps, write_bps)| DiskRate {
                    read_bps,
                    write_bps,
                }))
        })
        .await
        .map_err(|e| anyhow::anyhow!("sampler task join: {}", e))?
    }
}
