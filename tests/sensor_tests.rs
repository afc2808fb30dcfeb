// Sensor bridge lifecycle and failure-threshold policy

use std::sync::Arc;
use traymon::config::Configuration;
use traymon::models::{SensorKind, SensorState};
use traymon::sensor::SensorBridge;

mod common;
use common::FakeQuery;

/// Config with only the CPU temperature sensor enabled and no provider
/// executable to launch (the backend is queried directly).
fn cpu_temp_only() -> Configuration {
    let mut config = Configuration::default();
    config.lhm_exe = String::new();
    config.show_gpu = false;
    config
}

#[tokio::test]
async fn test_missing_executable_leaves_sensors_unavailable() {
    let mut config = Configuration::default();
    config.lhm_exe = "definitely/not/here/LibreHardwareMonitor.exe".into();
    let backend = Arc::new(FakeQuery::new(true, vec![]));
    let bridge = SensorBridge::new(backend.clone());

    bridge.start(&config).await.expect("start");
    assert!(!bridge.is_connected());

    let readings = bridge.poll_once(&config).await;
    assert_eq!(readings.cpu_temp, SensorState::Unavailable);
    assert_eq!(readings.gpu_load, SensorState::Unavailable);
    assert!(backend.queried().is_empty());
}

#[tokio::test]
async fn test_disabled_sensors_skip_start_entirely() {
    let mut config = cpu_temp_only();
    config.show_temps = false;
    let backend = Arc::new(FakeQuery::new(true, vec![]));
    let bridge = SensorBridge::new(backend);

    bridge.start(&config).await.expect("start");
    assert!(!bridge.is_connected());
}

#[tokio::test]
async fn test_probe_failure_stays_unavailable() {
    let config = cpu_temp_only();
    let backend = Arc::new(FakeQuery::new(false, vec![]));
    let bridge = SensorBridge::new(backend.clone());

    bridge.start(&config).await.expect("start");
    assert!(!bridge.is_connected());
    let readings = bridge.poll_once(&config).await;
    assert_eq!(readings.cpu_temp, SensorState::Unavailable);
    assert!(backend.queried().is_empty());
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let config = cpu_temp_only();
    let bridge = SensorBridge::new(Arc::new(FakeQuery::new(true, vec![])));
    bridge.start(&config).await.expect("first start");
    bridge.start(&config).await.expect("second start");
    assert!(bridge.is_connected());
}

#[tokio::test]
async fn test_successful_read_makes_sensor_available() {
    let config = cpu_temp_only();
    let backend = Arc::new(FakeQuery::new(true, vec![Ok(51.5)]));
    let bridge = SensorBridge::new(backend.clone());

    bridge.start(&config).await.expect("start");
    assert_eq!(bridge.readings().cpu_temp, SensorState::Starting);

    let readings = bridge.poll_once(&config).await;
    assert_eq!(readings.cpu_temp, SensorState::Available(51.5));
    assert_eq!(backend.queried(), vec![SensorKind::CpuTemp]);
}

#[tokio::test]
async fn test_two_failures_keep_last_value_third_degrades() {
    let config = cpu_temp_only();
    let backend = Arc::new(FakeQuery::new(
        true,
        vec![
            Ok(50.0),
            Err("read failed".into()),
            Err("read failed".into()),
            Err("read failed".into()),
        ],
    ));
    let bridge = SensorBridge::new(backend);
    bridge.start(&config).await.expect("start");

    assert_eq!(
        bridge.poll_once(&config).await.cpu_temp,
        SensorState::Available(50.0)
    );
    // Two consecutive failures: the last Available value stands.
    assert_eq!(
        bridge.poll_once(&config).await.cpu_temp,
        SensorState::Available(50.0)
    );
    assert_eq!(
        bridge.poll_once(&config).await.cpu_temp,
        SensorState::Available(50.0)
    );
    // Third consecutive failure crosses the threshold.
    assert_eq!(
        bridge.poll_once(&config).await.cpu_temp,
        SensorState::Unavailable
    );
}

#[tokio::test]
async fn test_success_resets_failure_streak() {
    let config = cpu_temp_only();
    let backend = Arc::new(FakeQuery::new(
        true,
        vec![
            Ok(50.0),
            Err("x".into()),
            Err("x".into()),
            Ok(60.0),
            Err("x".into()),
        ],
    ));
    let bridge = SensorBridge::new(backend);
    bridge.start(&config).await.expect("start");

    for _ in 0..3 {
        bridge.poll_once(&config).await;
    }
    assert_eq!(
        bridge.poll_once(&config).await.cpu_temp,
        SensorState::Available(60.0)
    );
    // A fresh single failure after the success does not degrade.
    assert_eq!(
        bridge.poll_once(&config).await.cpu_temp,
        SensorState::Available(60.0)
    );
}

#[tokio::test]
async fn test_only_enabled_kinds_are_queried() {
    let mut config = Configuration::default();
    config.lhm_exe = String::new();
    config.show_gpu_temp = false;
    let backend = Arc::new(FakeQuery::new(true, vec![]));
    let bridge = SensorBridge::new(backend.clone());
    bridge.start(&config).await.expect("start");

    bridge.poll_once(&config).await;
    assert_eq!(
        backend.queried(),
        vec![SensorKind::CpuTemp, SensorKind::GpuLoad]
    );
}

#[tokio::test]
async fn test_stop_without_process_is_a_noop() {
    let bridge = SensorBridge::new(Arc::new(FakeQuery::new(true, vec![])));
    bridge.stop().await;
    bridge.stop().await;
    assert!(!bridge.is_connected());
}

#[tokio::test]
async fn test_restart_clears_degraded_state() {
    let config = cpu_temp_only();
    let backend = Arc::new(FakeQuery::new(
        true,
        vec![
            Err("x".into()),
            Err("x".into()),
            Err("x".into()),
            Ok(45.0),
        ],
    ));
    let bridge = SensorBridge::new(backend);
    bridge.start(&config).await.expect("start");

    for _ in 0..3 {
        bridge.poll_once(&config).await;
    }
    assert_eq!(bridge.readings().cpu_temp, SensorState::Unavailable);

    bridge.restart(&config).await.expect("restart");
    assert_eq!(bridge.readings().cpu_temp, SensorState::Starting);
    assert_eq!(
        bridge.poll_once(&config).await.cpu_temp,
        SensorState::Available(45.0)
    );
}
