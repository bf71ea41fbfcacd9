use serde::{Deserialize, Serialize};

use crate::geometry::{DebugMode, MonitorBounds, WindowKind, WindowRect};

/// Geometry snapshot the host attaches to every event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostTopology {
    /// None when the host could not resolve the main window handle
    #[serde(default)]
    pub main_window: Option<WindowRect>,
    #[serde(default)]
    pub monitors: Vec<MonitorBounds>,
    #[serde(default)]
    pub debug_mode: DebugMode,
}

/// Message from the host adapter to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A window was moved or resized
    WindowMoved {
        window: WindowKind,
        topology: HostTopology,
    },
    /// The user asked to save the current layout explicitly
    SaveLayout { topology: HostTopology },
    /// The host is going away
    Shutdown,
}

/// Message from the daemon back to the host adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostReply {
    /// Text for the host's status bar
    Status { text: String, highlight: bool },
}

impl HostReply {
    pub fn status(text: impl Into<String>) -> Self {
        Self::Status {
            text: text.into(),
            highlight: true,
        }
    }
}
