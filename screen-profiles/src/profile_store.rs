use std::path::PathBuf;

use crate::core::{strip_settings_file, Config, ProfileKey, ProfileRepository};
use crate::error::ProfileError;
use crate::platform::{ConfigStore, SettingsDirection, SettingsHost};

/// Configuration store value holding the IDE's user settings root
pub const LOCATION_VALUE: &str = "VisualStudioLocation";
const SETTINGS_DIR: &str = "Settings";

/// Maps profile keys to settings file paths.
///
/// Paths are recomputed from the configuration store on every call.
pub struct SettingsLocator<C> {
    config_store: C,
    namespace: String,
    extension: String,
}

impl<C: ConfigStore> SettingsLocator<C> {
    pub fn new(config: &Config, config_store: C) -> Self {
        Self {
            config_store,
            namespace: config.namespace(),
            extension: config.extension.clone(),
        }
    }

    pub fn path_for(&self, key: &ProfileKey) -> Result<PathBuf, ProfileError> {
        let root = self
            .config_store
            .lookup(&self.namespace, LOCATION_VALUE)?
            .ok_or_else(|| ProfileError::ConfigLookup {
                namespace: self.namespace.clone(),
                key: LOCATION_VALUE.to_string(),
            })?;

        Ok(PathBuf::from(root)
            .join(SETTINGS_DIR)
            .join(format!("{}.{}", key, self.extension)))
    }
}

/// Layout snapshots on disk, imported and exported through the settings host.
pub struct ProfileStore<C, H> {
    locator: SettingsLocator<C>,
    host: H,
}

impl<C: ConfigStore, H: SettingsHost> ProfileStore<C, H> {
    pub fn new(config: &Config, config_store: C, host: H) -> Self {
        Self {
            locator: SettingsLocator::new(config, config_store),
            host,
        }
    }

    pub fn path_for(&self, key: &ProfileKey) -> Result<PathBuf, ProfileError> {
        self.locator.path_for(key)
    }
}

impl<C: ConfigStore, H: SettingsHost> ProfileRepository for ProfileStore<C, H> {
    fn has_snapshot(&self, key: &ProfileKey) -> bool {
        match self.path_for(key) {
            Ok(path) => path.is_file(),
            Err(e) => {
                tracing::debug!("Cannot locate snapshot for {}: {}", key, e);
                false
            }
        }
    }

    fn import_profile(&self, key: &ProfileKey) -> Result<(), ProfileError> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return Err(ProfileError::FileNotFound(path));
        }

        self.host.run(SettingsDirection::Import, &path)?;
        tracing::info!("Imported layout from {}", path.display());
        Ok(())
    }

    fn export_profile(&self, key: &ProfileKey) -> Result<(), ProfileError> {
        let path = self.path_for(key)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        self.host.run(SettingsDirection::Export, &path)?;
        strip_settings_file(&path)?;
        tracing::info!("Exported layout to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockConfigStore, MockSettingsHost};
    use std::path::Path;

    const EXPORT: &str = r#"<UserSettings><Category name="Text Editor"><X/></Category><Category name="Environment_Group"><Category name="Environment_Toolbars"/><Category name="Environment_WindowLayout"><Design/></Category></Category></UserSettings>"#;
    const STRIPPED: &str = r#"<UserSettings><Category name="Environment_Group"><Category name="Environment_WindowLayout"><Design/></Category></Category></UserSettings>"#;

    fn store_at(
        root: &Path,
        host: MockSettingsHost,
    ) -> ProfileStore<MockConfigStore, MockSettingsHost> {
        let config = Config::default();
        let config_store = MockConfigStore::new().with_value(
            &config.namespace(),
            LOCATION_VALUE,
            &root.to_string_lossy(),
        );
        ProfileStore::new(&config, config_store, host)
    }

    #[test]
    fn test_path_for_composes_settings_path() {
        let store = store_at(Path::new("/home/dev/vs"), MockSettingsHost::new());
        let path = store.path_for(&ProfileKey::new("Design-1x1@0x0")).unwrap();
        assert_eq!(
            path,
            PathBuf::from("/home/dev/vs/Settings/Design-1x1@0x0.vssettings")
        );
    }

    #[test]
    fn test_path_for_without_location_fails() {
        let config = Config::default();
        let store = ProfileStore::new(&config, MockConfigStore::new(), MockSettingsHost::new());

        let err = store.path_for(&ProfileKey::new("Design")).unwrap_err();
        assert!(matches!(err, ProfileError::ConfigLookup { .. }));
        assert!(err.is_missing_profile());
    }

    #[test]
    fn test_path_for_uses_configured_extension() {
        let config = Config {
            ide_version: "12.0".to_string(),
            extension: "xml".to_string(),
            ..Config::default()
        };
        let config_store = MockConfigStore::new().with_value(
            r"Software\Microsoft\VisualStudio\12.0",
            LOCATION_VALUE,
            "/vs",
        );
        let locator = SettingsLocator::new(&config, config_store);

        assert_eq!(
            locator.path_for(&ProfileKey::new("Debug")).unwrap(),
            PathBuf::from("/vs/Settings/Debug.xml")
        );
    }

    #[test]
    fn test_import_missing_file_does_not_call_host() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path(), MockSettingsHost::new());

        let err = store.import_profile(&ProfileKey::new("Design")).unwrap_err();

        assert!(matches!(err, ProfileError::FileNotFound(_)));
        assert!(store.host.runs().is_empty());
    }

    #[test]
    fn test_import_existing_file_calls_host() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path(), MockSettingsHost::new());
        let key = ProfileKey::new("Design");
        let path = store.path_for(&key).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, STRIPPED).unwrap();

        assert!(store.has_snapshot(&key));
        store.import_profile(&key).unwrap();

        assert_eq!(store.host.runs(), vec![(SettingsDirection::Import, path)]);
    }

    #[test]
    fn test_export_strips_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path(), MockSettingsHost::new().with_export_document(EXPORT));
        let key = ProfileKey::new("Design");

        assert!(!store.has_snapshot(&key));
        store.export_profile(&key).unwrap();

        let path = store.path_for(&key).unwrap();
        assert_eq!(store.host.runs(), vec![(SettingsDirection::Export, path.clone())]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), STRIPPED);
        assert!(store.has_snapshot(&key));
    }

    #[test]
    fn test_export_host_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path(), MockSettingsHost::new().failing());

        let err = store.export_profile(&ProfileKey::new("Design")).unwrap_err();
        assert!(matches!(err, ProfileError::Host { .. }));
        assert!(!err.is_missing_profile());
    }

    #[test]
    fn test_has_snapshot_without_location_is_false() {
        let config = Config::default();
        let store = ProfileStore::new(&config, MockConfigStore::new(), MockSettingsHost::new());
        assert!(!store.has_snapshot(&ProfileKey::new("Design")));
    }
}
