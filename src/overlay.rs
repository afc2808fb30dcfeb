// Overlay placement state machine, driven by abstract pointer events from
// whatever owns the UI surface. Persistence happens exactly twice: on
// pointer-up ending a drag, and on the unlocked->locked toggle.

use crate::config::{ConfigUpdate, Configuration, GridPreset};

/// Clearance above the bottom screen edge for the bottom-row presets.
const TASKBAR_CLEARANCE: i32 = 60;

/// Screen and overlay dimensions supplied by the UI surface with each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub screen_w: i32,
    pub screen_h: i32,
    pub overlay_w: i32,
    pub overlay_h: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPosition {
    Grid { preset: GridPreset, padding: i32 },
    Absolute { x: i32, y: i32 },
}

impl OverlayPosition {
    /// Screen coordinates of the overlay origin.
    pub fn resolve(&self, vp: &Viewport) -> (i32, i32) {
        match *self {
            OverlayPosition::Absolute { x, y } => (x, y),
            OverlayPosition::Grid { preset, padding } => {
                let (sw, sh) = (vp.screen_w, vp.screen_h);
                let (w, h) = (vp.overlay_w, vp.overlay_h);
                match preset {
                    GridPreset::TopLeft => (padding, padding),
                    GridPreset::TopRight => (sw - w - padding, padding),
                    GridPreset::BottomLeft => (padding, sh - h - TASKBAR_CLEARANCE),
                    GridPreset::BottomRight => {
                        (sw - w - padding, sh - h - TASKBAR_CLEARANCE)
                    }
                    GridPreset::Center => (
                        padding.max((sw - w) / 2),
                        padding.max((sh - h) / 2),
                    ),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down { x: i32, y: i32 },
    Move { x: i32, y: i32 },
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Locked,
    Unlocked,
    /// Offset between the pointer and the overlay origin at drag start.
    Dragging { offset_x: i32, offset_y: i32 },
}

#[derive(Debug)]
pub struct OverlayPositionState {
    mode: Mode,
    position: OverlayPosition,
}

impl OverlayPositionState {
    /// Explicit coordinates in the configuration win over the grid preset.
    pub fn from_config(config: &Configuration) -> Self {
        let position = match config.overlay_coords() {
            Some((x, y)) => OverlayPosition::Absolute { x, y },
            None => OverlayPosition::Grid {
                preset: config.overlay_pos,
                padding: config.overlay_padding,
            },
        };
        Self {
            mode: if config.overlay_locked {
                Mode::Locked
            } else {
                Mode::Unlocked
            },
            position,
        }
    }

    pub fn position(&self) -> OverlayPosition {
        self.position
    }

    pub fn is_locked(&self) -> bool {
        self.mode == Mode::Locked
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, Mode::Dragging { .. })
    }

    /// Lock/unlock flip. Locking also persists the current position as
    /// explicit coordinates; unlocking changes no position.
    pub fn toggle_lock(&mut self, vp: &Viewport) -> Vec<ConfigUpdate> {
        match self.mode {
            Mode::Locked => {
                self.mode = Mode::Unlocked;
                vec![ConfigUpdate::OverlayLocked(false)]
            }
            Mode::Unlocked | Mode::Dragging { .. } => {
                let (x, y) = self.position.resolve(vp);
                self.position = OverlayPosition::Absolute { x, y };
                self.mode = Mode::Locked;
                vec![
                    ConfigUpdate::OverlayLocked(true),
                    ConfigUpdate::OverlayPosition { x, y },
                ]
            }
        }
    }

    /// Drive the drag gesture. Only the pointer-up transition yields a
    /// persisted write; moves track the pointer in memory.
    pub fn pointer(&mut self, event: PointerEvent, vp: &Viewport) -> Option<ConfigUpdate> {
        match (self.mode, event) {
            (Mode::Unlocked, PointerEvent::Down { x, y }) => {
                let (ox, oy) = self.position.resolve(vp);
                self.position = OverlayPosition::Absolute { x: ox, y: oy };
                self.mode = Mode::Dragging {
                    offset_x: x - ox,
                    offset_y: y - oy,
                };
                None
            }
            (Mode::Dragging { offset_x, offset_y }, PointerEvent::Move { x, y }) => {
                self.position = OverlayPosition::Absolute {
                    x: x - offset_x,
                    y: y - offset_y,
                };
                None
            }
            (Mode::Dragging { .. }, PointerEvent::Up) => {
                self.mode = Mode::Unlocked;
                let OverlayPosition::Absolute { x, y } = self.position else {
                    return None;
                };
                Some(ConfigUpdate::OverlayPosition { x, y })
            }
            // Locked overlays ignore pointer input; stray moves/ups without a
            // drag in progress are no-ops.
            _ => None,
        }
    }

    /// Re-initialize from a reloaded configuration. An in-progress drag is
    /// cancelled; nothing was persisted during it, so the configuration still
    /// carries the pre-drag position.
    pub fn apply_reload(&mut self, config: &Configuration) {
        if self.is_dragging() {
            tracing::debug!("config reload during drag, drag cancelled");
        }
        *self = Self::from_config(config);
    }

    /// Tray menu grid preset selection; clears explicit coordinates.
    pub fn set_preset(&mut self, preset: GridPreset, padding: i32) {
        self.position = OverlayPosition::Grid { preset, padding };
    }

    /// Tray menu explicit coordinates.
    pub fn set_coords(&mut self, x: i32, y: i32) {
        self.position = OverlayPosition::Absolute { x, y };
    }
}
