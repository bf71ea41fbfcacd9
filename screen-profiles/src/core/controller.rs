use std::fmt;

use screen_profiles_ipc::WindowKind;

use super::ProfileKey;
use crate::error::ProfileError;

/// Storage of layout snapshots, keyed by profile.
/// This abstraction allows mocking in tests.
pub trait ProfileRepository {
    fn has_snapshot(&self, key: &ProfileKey) -> bool;
    fn import_profile(&self, key: &ProfileKey) -> Result<(), ProfileError>;
    fn export_profile(&self, key: &ProfileKey) -> Result<(), ProfileError>;
}

/// What a single notification led to
#[derive(Debug)]
pub enum SwitchOutcome {
    /// Main window moved within the already imported topology
    Unchanged,
    Imported(ProfileKey),
    ImportFailed {
        key: ProfileKey,
        error: ProfileError,
    },
    Exported(ProfileKey),
    ExportFailed {
        key: ProfileKey,
        error: ProfileError,
    },
    /// Secondary window moved but nothing has been saved for this topology
    NoSnapshot(ProfileKey),
}

impl fmt::Display for SwitchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchOutcome::Unchanged => f.write_str("layout unchanged"),
            SwitchOutcome::Imported(key) => write!(f, "imported {}", key),
            SwitchOutcome::ImportFailed { key, error } => {
                write!(f, "import of {} failed: {}", key, error)
            }
            SwitchOutcome::Exported(key) => write!(f, "exported {}", key),
            SwitchOutcome::ExportFailed { key, error } => {
                write!(f, "export of {} failed: {}", key, error)
            }
            SwitchOutcome::NoSnapshot(key) => write!(f, "no snapshot for {}", key),
        }
    }
}

/// Decides, per window notification, whether to import, export or do nothing.
///
/// The only state is the key of the last import attempt. It is updated before
/// the import runs and is not rolled back on failure, so a topology whose
/// import failed is not retried until the topology changes.
#[derive(Debug, Default)]
pub struct LayoutSwitchController {
    last_imported: Option<ProfileKey>,
}

impl LayoutSwitchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_imported(&self) -> Option<&ProfileKey> {
        self.last_imported.as_ref()
    }

    /// Whether a main window move to `key` would leave the layout alone
    pub fn is_current(&self, key: &ProfileKey) -> bool {
        self.last_imported.as_ref() == Some(key)
    }

    pub fn handle_window_moved<R: ProfileRepository + ?Sized>(
        &mut self,
        window: WindowKind,
        key: ProfileKey,
        repository: &R,
    ) -> SwitchOutcome {
        match window {
            WindowKind::Main => self.switch_to(key, repository),
            WindowKind::Other => refresh_snapshot(key, repository),
        }
    }

    /// Explicit save request: export whether or not a snapshot exists.
    pub fn save_layout<R: ProfileRepository + ?Sized>(
        &self,
        key: ProfileKey,
        repository: &R,
    ) -> SwitchOutcome {
        tracing::info!("Saving screen layout {}", key);
        export(key, repository)
    }

    fn switch_to<R: ProfileRepository + ?Sized>(
        &mut self,
        key: ProfileKey,
        repository: &R,
    ) -> SwitchOutcome {
        if self.is_current(&key) {
            tracing::trace!("Layout {} already active", key);
            return SwitchOutcome::Unchanged;
        }

        tracing::info!("Switching to screen layout {}", key);
        self.last_imported = Some(key.clone());

        match repository.import_profile(&key) {
            Ok(()) => SwitchOutcome::Imported(key),
            Err(error) => {
                if error.is_missing_profile() {
                    tracing::info!("No saved layout for {}: {}", key, error);
                } else {
                    tracing::warn!("Failed to import layout {}: {}", key, error);
                }
                SwitchOutcome::ImportFailed { key, error }
            }
        }
    }
}

fn refresh_snapshot<R: ProfileRepository + ?Sized>(
    key: ProfileKey,
    repository: &R,
) -> SwitchOutcome {
    if !repository.has_snapshot(&key) {
        tracing::trace!("No snapshot for {}, not exporting", key);
        return SwitchOutcome::NoSnapshot(key);
    }
    export(key, repository)
}

fn export<R: ProfileRepository + ?Sized>(key: ProfileKey, repository: &R) -> SwitchOutcome {
    match repository.export_profile(&key) {
        Ok(()) => {
            tracing::debug!("Exported layout {}", key);
            SwitchOutcome::Exported(key)
        }
        Err(error) => {
            tracing::warn!("Failed to export layout {}: {}", key, error);
            SwitchOutcome::ExportFailed { key, error }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockProfileRepository, RepositoryCall};

    fn key(s: &str) -> ProfileKey {
        ProfileKey::new(s)
    }

    #[test]
    fn test_first_main_window_event_imports() {
        let repo = MockProfileRepository::new();
        let mut controller = LayoutSwitchController::new();
        assert!(controller.last_imported().is_none());

        let outcome = controller.handle_window_moved(WindowKind::Main, key("Design-1x1@0x0"), &repo);

        assert!(matches!(outcome, SwitchOutcome::Imported(_)));
        assert_eq!(repo.import_count(), 1);
        assert_eq!(controller.last_imported(), Some(&key("Design-1x1@0x0")));
    }

    #[test]
    fn test_same_key_is_debounced() {
        let repo = MockProfileRepository::new();
        let mut controller = LayoutSwitchController::new();

        controller.handle_window_moved(WindowKind::Main, key("Design-1x1@0x0"), &repo);
        let outcome = controller.handle_window_moved(WindowKind::Main, key("DESIGN-1X1@0X0"), &repo);

        assert!(matches!(outcome, SwitchOutcome::Unchanged));
        assert_eq!(repo.import_count(), 1);
    }

    #[test]
    fn test_is_current_follows_last_import() {
        let repo = MockProfileRepository::new();
        let mut controller = LayoutSwitchController::new();
        assert!(!controller.is_current(&key("Design-A")));

        controller.handle_window_moved(WindowKind::Main, key("Design-A"), &repo);

        assert!(controller.is_current(&key("design-a")));
        assert!(!controller.is_current(&key("Design-B")));
    }

    #[test]
    fn test_outcome_display_names_key() {
        let repo = MockProfileRepository::new().with_failing_exports();
        let controller = LayoutSwitchController::new();

        let outcome = controller.save_layout(key("Design-A"), &repo);

        assert!(outcome.to_string().starts_with("export of Design-A failed"));
        assert_eq!(
            SwitchOutcome::NoSnapshot(key("Design-B")).to_string(),
            "no snapshot for Design-B"
        );
    }

    #[test]
    fn test_changed_key_imports_again() {
        let repo = MockProfileRepository::new();
        let mut controller = LayoutSwitchController::new();

        controller.handle_window_moved(WindowKind::Main, key("Design-A"), &repo);
        controller.handle_window_moved(WindowKind::Main, key("Design-B"), &repo);
        controller.handle_window_moved(WindowKind::Main, key("Design-A"), &repo);

        assert_eq!(
            repo.calls(),
            vec![
                RepositoryCall::Import(key("Design-A")),
                RepositoryCall::Import(key("Design-B")),
                RepositoryCall::Import(key("Design-A")),
            ]
        );
    }

    #[test]
    fn test_failed_import_still_updates_last_imported() {
        let repo = MockProfileRepository::new().with_failing_imports();
        let mut controller = LayoutSwitchController::new();

        let outcome = controller.handle_window_moved(WindowKind::Main, key("Design-A"), &repo);
        assert!(matches!(outcome, SwitchOutcome::ImportFailed { .. }));
        assert_eq!(controller.last_imported(), Some(&key("Design-A")));

        let outcome = controller.handle_window_moved(WindowKind::Main, key("Design-A"), &repo);
        assert!(matches!(outcome, SwitchOutcome::Unchanged));
        assert_eq!(repo.import_count(), 1);
    }

    #[test]
    fn test_other_window_exports_existing_snapshot() {
        let repo = MockProfileRepository::new().with_snapshots(vec![key("Design-A")]);
        let mut controller = LayoutSwitchController::new();

        let outcome = controller.handle_window_moved(WindowKind::Other, key("design-a"), &repo);

        assert!(matches!(outcome, SwitchOutcome::Exported(_)));
        assert_eq!(repo.calls(), vec![RepositoryCall::Export(key("Design-A"))]);
        assert!(controller.last_imported().is_none());
    }

    #[test]
    fn test_other_window_without_snapshot_does_nothing() {
        let repo = MockProfileRepository::new();
        let mut controller = LayoutSwitchController::new();

        let outcome = controller.handle_window_moved(WindowKind::Other, key("Design-A"), &repo);

        assert!(matches!(outcome, SwitchOutcome::NoSnapshot(_)));
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_other_window_ignores_last_imported() {
        let repo = MockProfileRepository::new().with_snapshots(vec![key("Design-A")]);
        let mut controller = LayoutSwitchController::new();

        controller.handle_window_moved(WindowKind::Main, key("Design-A"), &repo);
        controller.handle_window_moved(WindowKind::Other, key("Design-A"), &repo);
        controller.handle_window_moved(WindowKind::Other, key("Design-A"), &repo);

        assert_eq!(repo.import_count(), 1);
        assert_eq!(repo.export_count(), 2);
        assert_eq!(controller.last_imported(), Some(&key("Design-A")));
    }

    #[test]
    fn test_save_layout_exports_without_snapshot() {
        let repo = MockProfileRepository::new();
        let controller = LayoutSwitchController::new();

        let outcome = controller.save_layout(key("Design-A"), &repo);

        assert!(matches!(outcome, SwitchOutcome::Exported(_)));
        assert_eq!(repo.export_count(), 1);
    }

    #[test]
    fn test_export_failure_is_reported() {
        let repo = MockProfileRepository::new()
            .with_snapshots(vec![key("Design-A")])
            .with_failing_exports();
        let mut controller = LayoutSwitchController::new();

        let outcome = controller.handle_window_moved(WindowKind::Other, key("Design-A"), &repo);

        assert!(matches!(outcome, SwitchOutcome::ExportFailed { .. }));
    }
}
