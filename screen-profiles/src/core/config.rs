use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_IDE_VERSION: &str = "11.0";
pub const DEFAULT_EXTENSION: &str = "vssettings";
pub const DEFAULT_HOST_TIMEOUT_SECS: u64 = 120;

/// Daemon configuration, assembled from command line options.
#[derive(Debug, Clone)]
pub struct Config {
    /// IDE version, used as the configuration store namespace segment
    pub ide_version: String,
    /// File extension of settings snapshots, without the dot
    pub extension: String,
    /// JSON file backing the configuration store
    pub registry_path: PathBuf,
    /// Program and leading arguments of the settings import/export command
    pub host_command: Vec<String>,
    pub host_timeout: Duration,
}

impl Config {
    /// Configuration store namespace holding the IDE's settings location
    pub fn namespace(&self) -> String {
        format!(r"Software\Microsoft\VisualStudio\{}", self.ide_version)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ide_version: DEFAULT_IDE_VERSION.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            registry_path: default_registry_path(),
            host_command: Vec::new(),
            host_timeout: Duration::from_secs(DEFAULT_HOST_TIMEOUT_SECS),
        }
    }
}

pub fn default_registry_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("screen-profiles")
        .join("registry.json")
}
