use serde::{Deserialize, Serialize};

/// Main window rectangle as reported by the host.
///
/// Hosts fill `width`/`height` from a native rectangle whose last two fields
/// are the right and bottom edges, so they are coordinates rather than
/// extents. Consumers subtract `left`/`top` to get the real size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub top: i32,
    pub left: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowRect {
    pub fn new(top: i32, left: i32, width: i32, height: i32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// One monitor in host enumeration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// The IDE main window
    #[default]
    Main,
    /// Tool windows, documents and anything else the host reports
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugMode {
    #[default]
    Design,
    Debug,
}
