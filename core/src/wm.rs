//! Window manager store
//!
//! Tracks open application windows independent of their content: focus,
//! z-order, minimize/maximize, geometry. Z-indexes come from a monotonically
//! increasing counter, never reused while any window is open; at most one
//! window is focused at a time (or none). This layer does no geometry
//! clamping; that belongs to whatever is driving the drag.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Window spawn cascade step, in pixels.
const CASCADE_OFFSET: i32 = 32;
/// First z-index handed out by a fresh store.
const BASE_Z_INDEX: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowState {
    pub id: String,
    pub app_id: String,
    pub title: String,
    pub icon: String,
    pub minimized: bool,
    pub maximized: bool,
    pub z_index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub component_props: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WmStore {
    windows: std::collections::BTreeMap<String, WindowState>,
    focused_window_id: Option<String>,
    next_z_index: u64,
    viewport: Viewport,
    last_spawn: Option<(i32, i32)>,
}

impl Default for WmStore {
    fn default() -> Self {
        Self {
            windows: Default::default(),
            focused_window_id: None,
            next_z_index: BASE_Z_INDEX,
            viewport: Viewport::default(),
            last_spawn: None,
        }
    }
}

impl WmStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Viewport { width, height };
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn window(&self, id: &str) -> Option<&WindowState> {
        self.windows.get(id)
    }

    pub fn windows(&self) -> impl Iterator<Item = &WindowState> {
        self.windows.values()
    }

    pub fn focused_window_id(&self) -> Option<&str> {
        self.focused_window_id.as_deref()
    }

    /// Open a window. An existing id degrades to a focus (idempotent open).
    pub fn open_window(
        &mut self,
        id: &str,
        app_id: &str,
        title: &str,
        icon: &str,
        component_props: Map<String, Value>,
    ) {
        if self.windows.contains_key(id) {
            self.focus_window(id);
            return;
        }

        let (x, y, width, height) = self.spawn_geometry();
        self.last_spawn = Some((x, y));

        let window = WindowState {
            id: id.to_string(),
            app_id: app_id.to_string(),
            title: title.to_string(),
            icon: icon.to_string(),
            minimized: false,
            maximized: false,
            z_index: self.next_z_index,
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            component_props,
        };
        self.windows.insert(id.to_string(), window);
        self.focused_window_id = Some(id.to_string());
        self.next_z_index += 1;
    }

    /// Cascade from the last spawn position; recenter when the estimated
    /// frame would be pushed off-screen.
    fn spawn_geometry(&self) -> (i32, i32, u32, u32) {
        let vp_w = self.viewport.width.max(1) as i32;
        let vp_h = self.viewport.height.max(1) as i32;

        let narrow = vp_w < 640;
        let win_w = (vp_w as f64 * if narrow { 0.85 } else { 0.60 }) as i32;
        let win_h = (vp_h as f64 * if narrow { 0.60 } else { 0.85 }) as i32;

        let centered = ((vp_w - win_w) / 2, (vp_h - win_h) / 2);
        let (mut x, mut y) = match self.last_spawn {
            Some((lx, ly)) if !self.windows.is_empty() => {
                let candidate = (lx + CASCADE_OFFSET, ly + CASCADE_OFFSET);
                if candidate.0 + win_w > vp_w || candidate.1 + win_h > vp_h {
                    centered
                } else {
                    candidate
                }
            }
            _ => centered,
        };
        x = x.max(0);
        y = y.max(0);
        (x, y, win_w.max(0) as u32, win_h.max(0) as u32)
    }

    pub fn close_window(&mut self, id: &str) {
        self.windows.remove(id);
        if self.focused_window_id.as_deref() == Some(id) {
            self.focused_window_id = None;
        }
        if self.windows.is_empty() {
            self.last_spawn = None;
        }
    }

    /// Raise to a fresh top z-index, un-minimize, and take focus.
    pub fn focus_window(&mut self, id: &str) {
        let Some(window) = self.windows.get_mut(id) else {
            return;
        };
        window.z_index = self.next_z_index;
        window.minimized = false;
        self.next_z_index += 1;
        self.focused_window_id = Some(id.to_string());
    }

    pub fn minimize_window(&mut self, id: &str) {
        if let Some(window) = self.windows.get_mut(id) {
            window.minimized = true;
            if self.focused_window_id.as_deref() == Some(id) {
                self.focused_window_id = None;
            }
        }
    }

    pub fn toggle_maximize(&mut self, id: &str) {
        if let Some(window) = self.windows.get_mut(id) {
            window.maximized = !window.maximized;
        }
    }

    pub fn update_window_position(&mut self, id: &str, x: i32, y: i32) {
        if let Some(window) = self.windows.get_mut(id) {
            window.x = Some(x);
            window.y = Some(y);
        }
    }

    pub fn update_window_size(&mut self, id: &str, width: u32, height: u32) {
        if let Some(window) = self.windows.get_mut(id) {
            window.width = Some(width);
            window.height = Some(height);
        }
    }
}
