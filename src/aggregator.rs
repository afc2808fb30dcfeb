// Combines counter and sensor values into one formatted snapshot per tick.
// Placeholders render to their value or "n/a" when the show-flag is off or
// the value is unavailable; unknown placeholders pass through verbatim.

use crate::config::{Configuration, NetMode};
use crate::models::{
    DiskRate, NetRate, RamUsage, RenderedTick, SensorReadings, Snapshot,
};

/// Marker for hidden or unavailable values.
pub const NA: &str = "n/a";

/// Raw per-domain results of one tick's counter reads.
#[derive(Debug, Clone, Default)]
pub struct CounterReadings {
    pub cpu_percent: Option<f64>,
    pub ram: Option<RamUsage>,
    pub net: Option<Vec<(String, NetRate)>>,
    pub disk: Option<DiskRate>,
}

pub fn build_snapshot(
    timestamp: u64,
    readings: CounterReadings,
    sensors: SensorReadings,
) -> Snapshot {
    Snapshot {
        timestamp,
        cpu_percent: readings.cpu_percent,
        ram: readings.ram,
        net_per_iface: readings.net.unwrap_or_default(),
        disk: readings.disk,
        sensors,
    }
}

pub fn render_tick(config: &Configuration, snapshot: Snapshot) -> RenderedTick {
    let tooltip = tooltip_text(config, &snapshot);
    let overlay = overlay_text(config, &snapshot);
    RenderedTick {
        snapshot,
        tooltip,
        overlay,
    }
}

/// Rendered format template truncated to the first `tooltip_lines` lines.
pub fn tooltip_text(config: &Configuration, snapshot: &Snapshot) -> String {
    let rendered = render_template(&config.overlay_format, &tokens(config, snapshot, "\n"));
    rendered
        .lines()
        .take(config.tooltip_lines)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rendered format template with separate-mode net lines joined inline.
pub fn overlay_text(config: &Configuration, snapshot: &Snapshot) -> String {
    let rendered = render_template(&config.overlay_format, &tokens(config, snapshot, " / "));
    let trimmed = rendered.trim();
    if trimmed.is_empty() {
        // The overlay label keeps its size with a bare space.
        " ".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Substitute `{name}` placeholders. Order-independent; repeated placeholders
/// all substitute; names outside the token set are left verbatim.
pub fn render_template(template: &str, tokens: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in tokens {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

fn tokens(config: &Configuration, snapshot: &Snapshot, net_sep: &str) -> Vec<(&'static str, String)> {
    vec![
        ("cpu", cpu_token(config, snapshot)),
        ("ram", ram_token(config, snapshot)),
        ("net", net_lines(config, snapshot).join(net_sep)),
        ("disk", disk_token(config, snapshot)),
        ("gpu", gpu_token(config, snapshot)),
    ]
}

fn cpu_token(config: &Configuration, snapshot: &Snapshot) -> String {
    if !config.show_cpu {
        return NA.into();
    }
    let Some(percent) = snapshot.cpu_percent else {
        return NA.into();
    };
    let mut line = format!("CPU {percent:.0}%");
    if config.show_temps && config.show_cpu_temp
        && let Some(temp) = snapshot.sensors.cpu_temp.value()
    {
        line.push_str(&format!(" | {temp:.0}°C"));
    }
    line
}

fn ram_token(config: &Configuration, snapshot: &Snapshot) -> String {
    if !config.show_ram {
        return NA.into();
    }
    match snapshot.ram {
        Some(ram) => format!(
            "RAM {}/{}",
            human_bytes(ram.used as f64),
            human_bytes(ram.total as f64)
        ),
        None => NA.into(),
    }
}

fn net_lines(config: &Configuration, snapshot: &Snapshot) -> Vec<String> {
    if !config.show_net {
        return vec![NA.into()];
    }
    if snapshot.net_per_iface.is_empty() {
        return vec![NA.into()];
    }

    let multi = config.net_ifaces.as_deref();
    if multi.is_some() && config.net_mode == NetMode::Separate {
        return snapshot
            .net_per_iface
            .iter()
            .map(|(name, rate)| {
                format!(
                    "NET({name}) ↓{} ↑{}",
                    human_rate(rate.down_bps),
                    human_rate(rate.up_bps)
                )
            })
            .collect();
    }

    let total = NetRate::sum(snapshot.net_per_iface.iter().map(|(_, r)| *r));
    let label = match multi {
        Some(names) if !names.is_empty() => format!("NET({})", names.join("+")),
        _ => "NET".to_string(),
    };
    vec![format!(
        "{label} ↓{} ↑{}",
        human_rate(total.down_bps),
        human_rate(total.up_bps)
    )]
}

fn disk_token(config: &Configuration, snapshot: &Snapshot) -> String {
    if !config.show_disk {
        return NA.into();
    }
    match snapshot.disk {
        Some(DiskRate {
            read_bps,
            write_bps,
        }) => format!(
            "DISK R {} W {}",
            human_rate(read_bps),
            human_rate(write_bps)
        ),
        None => NA.into(),
    }
}

fn gpu_token(config: &Configuration, snapshot: &Snapshot) -> String {
    if !config.show_gpu {
        return NA.into();
    }
    let show_load = config.show_gpu_load;
    let show_temp = config.show_temps && config.show_gpu_temp;
    let load = snapshot.sensors.gpu_load.value().filter(|_| show_load);
    let temp = snapshot.sensors.gpu_temp.value().filter(|_| show_temp);

    if load.is_none() && temp.is_none() {
        return NA.into();
    }
    let mut parts = vec!["GPU".to_string()];
    if show_load {
        parts.push(match load {
            Some(v) => format!("{v:.0}%"),
            None => NA.into(),
        });
    }
    if let Some(t) = temp {
        parts.push(format!("{t:.0}°C"));
    }
    parts.join(" | ")
}

pub fn human_rate(bps: f64) -> String {
    const UNITS: [&str; 4] = ["B/s", "KB/s", "MB/s", "GB/s"];
    scale(bps, &UNITS)
}

pub fn human_bytes(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    scale(bytes, &UNITS)
}

fn scale(value: f64, units: &[&str]) -> String {
    let mut v = value.max(0.0);
    let mut i = 0;
    while v >= 1024.0 && i < units.len() - 1 {
        v /= 1024.0;
        i += 1;
    }
    format!("{:.1} {}", v, units[i])
}
