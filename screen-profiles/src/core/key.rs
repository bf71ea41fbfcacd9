use std::fmt;
use std::hash::{Hash, Hasher};

use screen_profiles_ipc::DebugMode;

use super::TopologySample;

/// Identifier of a layout snapshot. Comparison ignores ASCII case.
#[derive(Debug, Clone, Eq)]
pub struct ProfileKey(String);

impl ProfileKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for ProfileKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Hash for ProfileKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProfileKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Format a topology sample as its profile key.
///
/// The window token is `{w}x{h}@{top}x{left}` where `w = width - left` and
/// `h = height - top`: the host hands over right/bottom coordinates in the
/// width/height fields. Existing snapshot files are named after this exact
/// arithmetic, so it must not change.
pub fn derive_key(sample: &TopologySample) -> ProfileKey {
    let mut tokens = Vec::with_capacity(sample.monitors.len() + 2);

    tokens.push(
        match sample.debug_mode {
            DebugMode::Design => "Design",
            DebugMode::Debug => "Debug",
        }
        .to_string(),
    );

    let rect = &sample.main_window;
    tokens.push(format!(
        "{}x{}@{}x{}",
        rect.width.wrapping_sub(rect.left),
        rect.height.wrapping_sub(rect.top),
        rect.top,
        rect.left
    ));

    for monitor in &sample.monitors {
        tokens.push(format!(
            "{}x{}{}{}",
            monitor.width,
            monitor.height,
            if monitor.is_primary { "P" } else { "S" },
            if monitor.intersects_main_window { "A" } else { "" }
        ));
    }

    ProfileKey(tokens.join("-"))
}
