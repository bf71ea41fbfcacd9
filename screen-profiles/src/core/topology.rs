use screen_profiles_ipc::{DebugMode, MonitorBounds, WindowRect};

use crate::platform::DisplaySystem;

/// Monitor as it takes part in a profile key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSample {
    pub width: i32,
    pub height: i32,
    pub is_primary: bool,
    pub intersects_main_window: bool,
}

/// Normalized view of the display topology at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologySample {
    /// Raw main window rectangle (right/bottom style, see `WindowRect`)
    pub main_window: WindowRect,
    /// Monitors in host enumeration order
    pub monitors: Vec<MonitorSample>,
    pub debug_mode: DebugMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Window rectangle with the right/bottom fields turned into extents
    pub fn from_window(rect: &WindowRect) -> Self {
        Self {
            x: rect.left,
            y: rect.top,
            width: rect.width.wrapping_sub(rect.left),
            height: rect.height.wrapping_sub(rect.top),
        }
    }

    pub fn from_monitor(monitor: &MonitorBounds) -> Self {
        Self {
            x: monitor.x,
            y: monitor.y,
            width: monitor.width,
            height: monitor.height,
        }
    }

    /// Strict overlap; shared edges and empty rectangles never intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        let (ax, ay) = (self.x as i64, self.y as i64);
        let (bx, by) = (other.x as i64, other.y as i64);
        bx < ax + self.width as i64
            && ax < bx + other.width as i64
            && by < ay + self.height as i64
            && ay < by + other.height as i64
    }
}

/// Read the current topology from the display system. Nothing is cached.
pub fn sample<D: DisplaySystem + ?Sized>(system: &D) -> TopologySample {
    let main_window = system.main_window_rect().unwrap_or_else(|| {
        tracing::debug!("Main window rectangle unavailable, using an empty rectangle");
        WindowRect::default()
    });
    let window_bounds = Rect::from_window(&main_window);

    let monitors = system
        .monitors()
        .iter()
        .map(|monitor| MonitorSample {
            width: monitor.width,
            height: monitor.height,
            is_primary: monitor.is_primary,
            intersects_main_window: Rect::from_monitor(monitor).intersects(&window_bounds),
        })
        .collect();

    TopologySample {
        main_window,
        monitors,
        debug_mode: system.debug_mode(),
    }
}
