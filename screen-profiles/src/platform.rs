use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use screen_profiles_ipc::{DebugMode, HostTopology, MonitorBounds, WindowRect};

use crate::error::ProfileError;

const HOST_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Trait for querying window and monitor geometry from the host.
/// This abstraction allows mocking in tests.
pub trait DisplaySystem {
    /// None when the main window handle cannot be resolved
    fn main_window_rect(&self) -> Option<WindowRect>;
    /// Monitors in the host's enumeration order
    fn monitors(&self) -> Vec<MonitorBounds>;
    fn debug_mode(&self) -> DebugMode;
}

/// The geometry attached to a host event is the display system as of that event.
impl DisplaySystem for HostTopology {
    fn main_window_rect(&self) -> Option<WindowRect> {
        self.main_window
    }

    fn monitors(&self) -> Vec<MonitorBounds> {
        self.monitors.clone()
    }

    fn debug_mode(&self) -> DebugMode {
        self.debug_mode
    }
}

/// Per-user key-value configuration store, namespaced like a registry.
pub trait ConfigStore {
    fn lookup(&self, namespace: &str, key: &str) -> Result<Option<String>, ProfileError>;
}

/// Configuration store backed by a JSON file of the form
/// `{"<namespace>": {"<key>": "<value>"}}`. Namespaces match case-insensitively.
///
/// The file is opened for each lookup and closed before returning.
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for JsonConfigStore {
    fn lookup(&self, namespace: &str, key: &str) -> Result<Option<String>, ProfileError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Configuration store {} does not exist", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let registry: HashMap<String, HashMap<String, String>> =
            serde_json::from_reader(BufReader::new(file)).map_err(io::Error::from)?;

        Ok(registry
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(namespace))
            .and_then(|(_, values)| values.get(key).cloned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsDirection {
    Import,
    Export,
}

impl fmt::Display for SettingsDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsDirection::Import => f.write_str("import"),
            SettingsDirection::Export => f.write_str("export"),
        }
    }
}

/// The IDE's own settings import/export command.
/// This abstraction allows mocking in tests.
pub trait SettingsHost {
    fn run(&self, direction: SettingsDirection, path: &Path) -> Result<(), ProfileError>;
}

/// Runs an external program as `<program> [args...] <import|export> <path>`.
///
/// The program's stdout is discarded since ours carries host replies. A run
/// that exceeds the timeout is killed and reported as failed.
pub struct CommandSettingsHost {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSettingsHost {
    /// None if `command` is empty
    pub fn new(command: &[String], timeout: Duration) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }
}

impl SettingsHost for CommandSettingsHost {
    fn run(&self, direction: SettingsDirection, path: &Path) -> Result<(), ProfileError> {
        let host_error = |message: String| ProfileError::Host { direction, message };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(direction.to_string())
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| host_error(format!("failed to spawn '{}': {}", self.program, e)))?;

        tracing::debug!(
            "Spawned settings host '{}' ({} {})",
            self.program,
            direction,
            path.display()
        );

        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                if status.success() {
                    return Ok(());
                }
                return Err(host_error(format!("'{}' exited with {}", self.program, status)));
            }

            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    tracing::warn!("Failed to kill settings host '{}': {}", self.program, e);
                }
                let _ = child.wait();
                return Err(host_error(format!(
                    "'{}' timed out after {}s",
                    self.program,
                    self.timeout.as_secs()
                )));
            }

            std::thread::sleep(HOST_POLL_INTERVAL);
        }
    }
}
