pub mod geometry;
pub mod host;

pub use geometry::{DebugMode, MonitorBounds, WindowKind, WindowRect};
pub use host::{HostEvent, HostReply, HostTopology};
