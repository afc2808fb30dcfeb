// Shared test helpers

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use traymon::models::SensorKind;
use traymon::sensor::backend::SensorQuery;

/// Scripted sensor backend: each query pops the next result; an exhausted
/// script keeps succeeding with 42.0.
pub struct FakeQuery {
    probe_ok: bool,
    script: Mutex<VecDeque<Result<f64, String>>>,
    queried: Mutex<Vec<SensorKind>>,
}

impl FakeQuery {
    pub fn new(probe_ok: bool, script: Vec<Result<f64, String>>) -> Self {
        Self {
            probe_ok,
            script: Mutex::new(script.into()),
            queried: Mutex::new(Vec::new()),
        }
    }

    pub fn queried(&self) -> Vec<SensorKind> {
        self.queried.lock().unwrap().clone()
    }
}

impl SensorQuery for FakeQuery {
    fn probe(&self) -> anyhow::Result<()> {
        if self.probe_ok {
            Ok(())
        } else {
            anyhow::bail!("probe refused")
        }
    }

    fn query(&self, kind: SensorKind) -> anyhow::Result<f64> {
        self.queried.lock().unwrap().push(kind);
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(v)) => Ok(v),
            Some(Err(e)) => Err(anyhow::anyhow!(e)),
            None => Ok(42.0),
        }
    }
}

pub fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.json");
    std::fs::write(&path, contents).unwrap();
    path
}
