// Configuration document: JSON with # and // line comments tolerated.
// Document-level parse errors reject the whole load; individual fields fall
// back to defaults when missing or of the wrong type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Floor for the tick interval regardless of `refresh_s`.
pub const MIN_REFRESH_SECS: f64 = 0.25;

const DEFAULT_REFRESH_S: f64 = 1.0;
const DEFAULT_TOOLTIP_LINES: usize = 6;
const DEFAULT_OVERLAY_FORMAT: &str = "{cpu}\n{ram}\n{net}\n{disk}\n{gpu}";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetMode {
    #[default]
    Aggregate,
    Separate,
}

/// Named screen-relative overlay placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridPreset {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

/// Overlay font descriptor, serialized as `["family", size]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSpec(pub String, pub u32);

impl Default for FontSpec {
    fn default() -> Self {
        FontSpec("Segoe UI".into(), 10)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub refresh_s: f64,

    pub show_cpu: bool,
    pub show_ram: bool,
    pub show_net: bool,
    pub show_disk: bool,

    pub show_temps: bool,
    pub show_cpu_temp: bool,
    pub show_gpu: bool,
    pub show_gpu_temp: bool,
    pub show_gpu_load: bool,

    pub tooltip_lines: usize,

    /// Legacy single-interface selection; `"auto"` picks the busiest up interface.
    pub net_iface: String,
    /// Multi-interface selection; `None` defers to `net_iface`.
    pub net_ifaces: Option<Vec<String>>,
    pub net_mode: NetMode,

    pub lhm_exe: String,
    pub lhm_run_hidden: bool,
    pub lhm_wmi_namespace: String,

    pub overlay_enabled: bool,
    pub overlay_format: String,
    pub overlay_pos: GridPreset,
    pub overlay_x: Option<i32>,
    pub overlay_y: Option<i32>,
    pub overlay_locked: bool,
    pub overlay_padding: i32,
    pub overlay_bg: String,
    pub overlay_fg: String,
    pub overlay_font: FontSpec,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            refresh_s: DEFAULT_REFRESH_S,
            show_cpu: true,
            show_ram: true,
            show_net: true,
            show_disk: true,
            show_temps: true,
            show_cpu_temp: true,
            show_gpu: true,
            show_gpu_temp: true,
            show_gpu_load: true,
            tooltip_lines: DEFAULT_TOOLTIP_LINES,
            net_iface: "auto".into(),
            net_ifaces: None,
            net_mode: NetMode::Aggregate,
            lhm_exe: "LibreHardwareMonitor.exe".into(),
            lhm_run_hidden: true,
            lhm_wmi_namespace: r"root\LibreHardwareMonitor".into(),
            overlay_enabled: false,
            overlay_format: DEFAULT_OVERLAY_FORMAT.into(),
            overlay_pos: GridPreset::BottomRight,
            overlay_x: None,
            overlay_y: None,
            overlay_locked: true,
            overlay_padding: 10,
            overlay_bg: "black".into(),
            overlay_fg: "white".into(),
            overlay_font: FontSpec::default(),
        }
    }
}

impl Configuration {
    /// Tick period with the polling floor applied.
    pub fn effective_refresh(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.refresh_s.max(MIN_REFRESH_SECS))
    }

    /// Explicit coordinates override any grid preset.
    pub fn overlay_coords(&self) -> Option<(i32, i32)> {
        match (self.overlay_x, self.overlay_y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }

    fn from_raw(raw: RawConfig) -> Self {
        let d = Configuration::default();
        Self {
            refresh_s: raw
                .refresh_s
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(d.refresh_s),
            show_cpu: raw.show_cpu.unwrap_or(d.show_cpu),
            show_ram: raw.show_ram.unwrap_or(d.show_ram),
            show_net: raw.show_net.unwrap_or(d.show_net),
            show_disk: raw.show_disk.unwrap_or(d.show_disk),
            show_temps: raw.show_temps.unwrap_or(d.show_temps),
            show_cpu_temp: raw.show_cpu_temp.unwrap_or(d.show_cpu_temp),
            show_gpu: raw.show_gpu.unwrap_or(d.show_gpu),
            show_gpu_temp: raw.show_gpu_temp.unwrap_or(d.show_gpu_temp),
            show_gpu_load: raw.show_gpu_load.unwrap_or(d.show_gpu_load),
            tooltip_lines: raw
                .tooltip_lines
                .filter(|v| *v >= 0)
                .map(|v| v as usize)
                .unwrap_or(d.tooltip_lines),
            net_iface: raw.net_iface.unwrap_or(d.net_iface),
            net_ifaces: raw.net_ifaces,
            net_mode: raw.net_mode.unwrap_or(d.net_mode),
            lhm_exe: raw.lhm_exe.unwrap_or(d.lhm_exe),
            lhm_run_hidden: raw.lhm_run_hidden.unwrap_or(d.lhm_run_hidden),
            lhm_wmi_namespace: raw.lhm_wmi_namespace.unwrap_or(d.lhm_wmi_namespace),
            overlay_enabled: raw.overlay_enabled.unwrap_or(d.overlay_enabled),
            overlay_format: raw.overlay_format.unwrap_or(d.overlay_format),
            overlay_pos: raw.overlay_pos.unwrap_or(d.overlay_pos),
            overlay_x: raw.overlay_x,
            overlay_y: raw.overlay_y,
            overlay_locked: raw.overlay_locked.unwrap_or(d.overlay_locked),
            overlay_padding: raw.overlay_padding.unwrap_or(d.overlay_padding),
            overlay_bg: raw.overlay_bg.unwrap_or(d.overlay_bg),
            overlay_fg: raw.overlay_fg.unwrap_or(d.overlay_fg),
            overlay_font: raw.overlay_font.unwrap_or(d.overlay_font),
        }
    }
}

/// Raw document view: every field optional, wrong-typed fields become `None`.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default, deserialize_with = "lenient")]
    refresh_s: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    show_cpu: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    show_ram: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    show_net: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    show_disk: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    show_temps: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    show_cpu_temp: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    show_gpu: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    show_gpu_temp: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    show_gpu_load: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    tooltip_lines: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    net_iface: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    net_ifaces: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    net_mode: Option<NetMode>,
    #[serde(default, deserialize_with = "lenient")]
    lhm_exe: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    lhm_run_hidden: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    lhm_wmi_namespace: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    overlay_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    overlay_format: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    overlay_pos: Option<GridPreset>,
    #[serde(default, deserialize_with = "lenient")]
    overlay_x: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    overlay_y: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    overlay_locked: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    overlay_padding: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    overlay_bg: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    overlay_fg: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    overlay_font: Option<FontSpec>,
}

fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(de)?;
    Ok(serde_json::from_value(value).ok())
}

/// Strip `#` and `//` line comments, ignoring markers inside double quotes.
pub fn strip_line_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let bytes: Vec<char> = line.chars().collect();
        let mut in_str = false;
        let mut esc = false;
        let mut cut = bytes.len();
        let mut j = 0;
        while j < bytes.len() {
            let ch = bytes[j];
            if esc {
                esc = false;
            } else if ch == '\\' {
                esc = true;
            } else if ch == '"' {
                in_str = !in_str;
            } else if !in_str {
                if ch == '#' {
                    cut = j;
                    break;
                }
                if ch == '/' && bytes.get(j + 1) == Some(&'/') {
                    cut = j;
                    break;
                }
            }
            j += 1;
        }
        out.extend(bytes[..cut].iter());
    }
    out
}

/// Field updates persisted by the overlay state machine and menu commands.
/// Each variant maps to the document keys it writes back.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigUpdate {
    OverlayPosition { x: i32, y: i32 },
    OverlayPreset(GridPreset),
    OverlayEnabled(bool),
    OverlayLocked(bool),
    OverlayColors { bg: String, fg: String },
}

impl ConfigUpdate {
    fn document_keys(&self) -> Vec<(&'static str, Value)> {
        match self {
            ConfigUpdate::OverlayPosition { x, y } => vec![
                ("overlay_x", Value::from(*x)),
                ("overlay_y", Value::from(*y)),
            ],
            ConfigUpdate::OverlayPreset(preset) => vec![
                (
                    "overlay_pos",
                    serde_json::to_value(preset).unwrap_or(Value::Null),
                ),
                ("overlay_x", Value::Null),
                ("overlay_y", Value::Null),
            ],
            ConfigUpdate::OverlayEnabled(v) => vec![("overlay_enabled", Value::from(*v))],
            ConfigUpdate::OverlayLocked(v) => vec![("overlay_locked", Value::from(*v))],
            ConfigUpdate::OverlayColors { bg, fg } => vec![
                ("overlay_bg", Value::from(bg.clone())),
                ("overlay_fg", Value::from(fg.clone())),
            ],
        }
    }

    fn apply(&self, cfg: &mut Configuration) {
        match self {
            ConfigUpdate::OverlayPosition { x, y } => {
                cfg.overlay_x = Some(*x);
                cfg.overlay_y = Some(*y);
            }
            ConfigUpdate::OverlayPreset(preset) => {
                cfg.overlay_pos = *preset;
                cfg.overlay_x = None;
                cfg.overlay_y = None;
            }
            ConfigUpdate::OverlayEnabled(v) => cfg.overlay_enabled = *v,
            ConfigUpdate::OverlayLocked(v) => cfg.overlay_locked = *v,
            ConfigUpdate::OverlayColors { bg, fg } => {
                cfg.overlay_bg = bg.clone();
                cfg.overlay_fg = fg.clone();
            }
        }
    }
}

/// Active configuration plus its on-disk document. Reload swaps the whole
/// value; persistence merges single keys back into the document.
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<Arc<Configuration>>,
}

impl ConfigStore {
    /// Load the document at `path`, falling back to built-in defaults when it
    /// is missing or invalid (startup is never fatal).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = match Self::load_file(&path) {
            Ok(c) => c,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Configuration::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "invalid config, using defaults");
                Configuration::default()
            }
        };
        Self {
            path,
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn load_file(path: &Path) -> Result<Configuration, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse and validate a config document (e.g. for tests).
    pub fn parse(text: &str) -> Result<Configuration, ConfigError> {
        let cooked = strip_line_comments(text);
        let raw: RawConfig = serde_json::from_str(&cooked)?;
        Ok(Configuration::from_raw(raw))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Arc<Configuration> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Re-read the document. All-or-nothing: any document-level failure keeps
    /// the active configuration untouched.
    pub fn reload(&self) -> Result<Arc<Configuration>, ConfigError> {
        let config = Arc::new(Self::load_file(&self.path)?);
        self.swap(config.clone());
        Ok(config)
    }

    /// Merge `update` into the active configuration and the on-disk document.
    /// Unknown document keys are preserved; the write is atomic
    /// (temp file + rename).
    pub fn persist(&self, update: ConfigUpdate) -> Result<(), ConfigError> {
        let mut next = (*self.current()).clone();
        update.apply(&mut next);
        self.swap(Arc::new(next));

        let mut doc = match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str::<Value>(&strip_line_comments(&raw))
                .ok()
                .and_then(|v| v.as_object().cloned())
                .unwrap_or_default(),
            Err(_) => serde_json::Map::new(),
        };
        for (key, value) in update.document_keys() {
            doc.insert(key.to_string(), value);
        }

        let tmp = self.path.with_extension("json.tmp");
        let rendered = serde_json::to_string_pretty(&Value::Object(doc))?;
        std::fs::write(&tmp, rendered)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn swap(&self, config: Arc<Configuration>) {
        match self.current.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }
}
