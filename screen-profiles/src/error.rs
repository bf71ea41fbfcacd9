use std::path::PathBuf;

use crate::platform::SettingsDirection;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("no value '{key}' under '{namespace}' in the configuration store")]
    ConfigLookup { namespace: String, key: String },

    #[error("settings file {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to parse settings document: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("settings document ended inside an open element")]
    TruncatedDocument,

    #[error("settings {direction} failed: {message}")]
    Host {
        direction: SettingsDirection,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProfileError {
    /// Failures that only mean "nothing saved for this topology yet"
    pub fn is_missing_profile(&self) -> bool {
        matches!(
            self,
            ProfileError::ConfigLookup { .. } | ProfileError::FileNotFound(_)
        )
    }
}
