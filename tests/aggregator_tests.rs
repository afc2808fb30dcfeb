// Snapshot assembly, template rendering, aggregation modes, truncation

use traymon::aggregator::{
    self, CounterReadings, build_snapshot, human_bytes, human_rate, render_template,
    tooltip_text,
};
use traymon::config::{Configuration, NetMode};
use traymon::models::{DiskRate, NetRate, RamUsage, SensorReadings, SensorState, Snapshot};

fn snapshot_with(readings: CounterReadings, sensors: SensorReadings) -> Snapshot {
    build_snapshot(0, readings, sensors)
}

fn net(up: f64, down: f64) -> NetRate {
    NetRate {
        up_bps: up,
        down_bps: down,
    }
}

#[test]
fn test_hidden_and_missing_values_render_na() {
    let mut config = Configuration::default();
    config.show_cpu = false;
    config.show_ram = true;
    config.overlay_format = "{cpu}\n{ram}".into();

    let snapshot = snapshot_with(
        CounterReadings {
            cpu_percent: Some(50.0),
            ram: Some(RamUsage {
                used: 512 * 1024 * 1024,
                total: 1024 * 1024 * 1024,
            }),
            ..Default::default()
        },
        SensorReadings::default(),
    );

    let tooltip = tooltip_text(&config, &snapshot);
    let lines: Vec<&str> = tooltip.lines().collect();
    assert_eq!(lines[0], "n/a");
    assert_eq!(lines[1], "RAM 512.0 MB/1.0 GB");
}

#[test]
fn test_unknown_placeholder_passes_through_verbatim() {
    let rendered = render_template("{cpu} {unknown} {cpu}", &[("cpu", "CPU 10%".into())]);
    assert_eq!(rendered, "CPU 10% {unknown} CPU 10%");
}

#[test]
fn test_template_order_independent() {
    let tokens: Vec<(&str, String)> = vec![("cpu", "C".into()), ("ram", "R".into())];
    assert_eq!(render_template("{ram}|{cpu}", &tokens), "R|C");
    assert_eq!(render_template("{cpu}|{ram}", &tokens), "C|R");
}

#[test]
fn test_aggregate_mode_sums_interface_rates() {
    let mut config = Configuration::default();
    config.net_ifaces = Some(vec!["eth0".into(), "wlan0".into()]);
    config.net_mode = NetMode::Aggregate;
    config.overlay_format = "{net}".into();

    let snapshot = snapshot_with(
        CounterReadings {
            net: Some(vec![
                ("eth0".into(), net(1024.0, 512.0)),
                ("wlan0".into(), net(1024.0, 512.0)),
            ]),
            ..Default::default()
        },
        SensorReadings::default(),
    );

    let tooltip = tooltip_text(&config, &snapshot);
    assert_eq!(tooltip, "NET(eth0+wlan0) ↓1.0 KB/s ↑2.0 KB/s");
}

#[test]
fn test_aggregate_sum_holds_for_any_partition() {
    let rates = [
        net(10.0, 1.0),
        net(20.0, 2.0),
        net(30.0, 3.0),
        net(40.0, 4.0),
    ];
    let whole = NetRate::sum(rates);
    let split_a = NetRate::sum([NetRate::sum(rates[..2].to_vec()), NetRate::sum(rates[2..].to_vec())]);
    let split_b = NetRate::sum([NetRate::sum(rates[..1].to_vec()), NetRate::sum(rates[1..].to_vec())]);
    assert_eq!(whole, split_a);
    assert_eq!(whole, split_b);
    assert_eq!(whole.up_bps, 100.0);
    assert_eq!(whole.down_bps, 10.0);
}

#[test]
fn test_separate_mode_renders_one_line_per_interface_in_order() {
    let mut config = Configuration::default();
    config.net_ifaces = Some(vec!["eth0".into(), "wlan0".into()]);
    config.net_mode = NetMode::Separate;
    config.overlay_format = "{net}".into();

    let snapshot = snapshot_with(
        CounterReadings {
            net: Some(vec![
                ("eth0".into(), net(1024.0, 2048.0)),
                ("wlan0".into(), net(0.0, 512.0)),
            ]),
            ..Default::default()
        },
        SensorReadings::default(),
    );

    let tooltip = tooltip_text(&config, &snapshot);
    let lines: Vec<&str> = tooltip.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "NET(eth0) ↓2.0 KB/s ↑1.0 KB/s");
    assert_eq!(lines[1], "NET(wlan0) ↓512.0 B/s ↑0.0 B/s");
}

#[test]
fn test_single_interface_label_has_no_names() {
    let mut config = Configuration::default();
    config.overlay_format = "{net}".into();
    let snapshot = snapshot_with(
        CounterReadings {
            net: Some(vec![("eth0".into(), net(0.0, 1024.0))]),
            ..Default::default()
        },
        SensorReadings::default(),
    );
    assert_eq!(tooltip_text(&config, &snapshot), "NET ↓1.0 KB/s ↑0.0 B/s");
}

#[test]
fn test_unavailable_network_renders_na() {
    let mut config = Configuration::default();
    config.overlay_format = "{net}".into();
    let snapshot = snapshot_with(CounterReadings::default(), SensorReadings::default());
    assert_eq!(tooltip_text(&config, &snapshot), "n/a");
}

#[test]
fn test_tooltip_truncates_to_configured_lines() {
    let mut config = Configuration::default();
    config.tooltip_lines = 3;
    config.overlay_format = "{cpu}\n{ram}\n{net}\n{disk}\n{gpu}\nfooter".into();

    let snapshot = snapshot_with(
        CounterReadings {
            cpu_percent: Some(10.0),
            ram: Some(RamUsage {
                used: 1024,
                total: 2048,
            }),
            ..Default::default()
        },
        SensorReadings::default(),
    );

    let tooltip = tooltip_text(&config, &snapshot);
    let lines: Vec<&str> = tooltip.lines().collect();
    assert_eq!(lines, vec!["CPU 10%", "RAM 1.0 KB/2.0 KB", "n/a"]);
}

#[test]
fn test_cpu_line_includes_available_temperature() {
    let mut config = Configuration::default();
    config.overlay_format = "{cpu}".into();
    let snapshot = snapshot_with(
        CounterReadings {
            cpu_percent: Some(42.4),
            ..Default::default()
        },
        SensorReadings {
            cpu_temp: SensorState::Available(55.6),
            ..Default::default()
        },
    );
    assert_eq!(tooltip_text(&config, &snapshot), "CPU 42% | 56°C");
}

#[test]
fn test_gpu_line_renders_load_and_temp() {
    let mut config = Configuration::default();
    config.overlay_format = "{gpu}".into();
    let snapshot = snapshot_with(
        CounterReadings::default(),
        SensorReadings {
            gpu_load: SensorState::Available(33.0),
            gpu_temp: SensorState::Available(71.0),
            ..Default::default()
        },
    );
    assert_eq!(tooltip_text(&config, &snapshot), "GPU 33% | 71°C");
}

#[test]
fn test_gpu_line_na_when_all_sensors_unavailable() {
    let mut config = Configuration::default();
    config.overlay_format = "{gpu}".into();
    let snapshot = snapshot_with(CounterReadings::default(), SensorReadings::default());
    assert_eq!(tooltip_text(&config, &snapshot), "n/a");
}

#[test]
fn test_disk_line_formats_rates() {
    let mut config = Configuration::default();
    config.overlay_format = "{disk}".into();
    let snapshot = snapshot_with(
        CounterReadings {
            disk: Some(DiskRate {
                read_bps: 1024.0 * 1024.0,
                write_bps: 512.0,
            }),
            ..Default::default()
        },
        SensorReadings::default(),
    );
    assert_eq!(tooltip_text(&config, &snapshot), "DISK R 1.0 MB/s W 512.0 B/s");
}

#[test]
fn test_overlay_text_joins_separate_net_inline() {
    let mut config = Configuration::default();
    config.net_ifaces = Some(vec!["a".into(), "b".into()]);
    config.net_mode = NetMode::Separate;
    config.overlay_format = "{net}".into();
    let snapshot = snapshot_with(
        CounterReadings {
            net: Some(vec![
                ("a".into(), net(0.0, 0.0)),
                ("b".into(), net(0.0, 0.0)),
            ]),
            ..Default::default()
        },
        SensorReadings::default(),
    );
    let overlay = aggregator::overlay_text(&config, &snapshot);
    assert!(overlay.contains("NET(a)"));
    assert!(overlay.contains(" / "));
    assert!(!overlay.contains('\n'));
}

#[test]
fn test_overlay_text_never_empty() {
    let mut config = Configuration::default();
    config.overlay_format = "".into();
    let snapshot = snapshot_with(CounterReadings::default(), SensorReadings::default());
    assert_eq!(aggregator::overlay_text(&config, &snapshot), " ");
}

#[test]
fn test_human_rate_units() {
    assert_eq!(human_rate(0.0), "0.0 B/s");
    assert_eq!(human_rate(-5.0), "0.0 B/s");
    assert_eq!(human_rate(1024.0), "1.0 KB/s");
    assert_eq!(human_rate(1536.0), "1.5 KB/s");
    assert_eq!(human_rate(1024.0 * 1024.0 * 1024.0 * 2.0), "2.0 GB/s");
}

#[test]
fn test_human_bytes_units() {
    assert_eq!(human_bytes(512.0), "512.0 B");
    assert_eq!(human_bytes(1024.0 * 1024.0), "1.0 MB");
    assert_eq!(human_bytes(1024.0_f64.powi(4) * 3.0), "3.0 TB");
}
