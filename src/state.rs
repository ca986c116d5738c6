use tracing::{info, warn};

use crate::settings::{AppSettings, SettingKey, SettingsStore};

/// In-memory settings plus the store they persist to. All mutation goes
/// through the setters below so memory and disk never diverge.
#[derive(Debug)]
pub struct AppState {
    settings: AppSettings,
    store: SettingsStore,
}

impl AppState {
    pub fn new(store: SettingsStore) -> Self {
        let settings = AppSettings::load(&store);
        info!(
            size = settings.window_size,
            inverted = settings.inverted,
            always_on_top = settings.always_on_top,
            sleepy = settings.sleepy,
            "Settings loaded"
        );
        Self { settings, store }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn window_size(&self) -> u32 {
        self.settings.window_size
    }

    pub fn inverted(&self) -> bool {
        self.settings.inverted
    }

    pub fn always_on_top(&self) -> bool {
        self.settings.always_on_top
    }

    pub fn sleepy(&self) -> bool {
        self.settings.sleepy
    }

    pub fn set_window_size(&mut self, size: u32) {
        self.settings.window_size = size;
        self.persist(SettingKey::WindowSize, size);
    }

    pub fn toggle_inverted(&mut self) -> bool {
        self.settings.inverted = !self.settings.inverted;
        self.persist(SettingKey::InvertedState, self.settings.inverted);
        self.settings.inverted
    }

    pub fn toggle_always_on_top(&mut self) -> bool {
        self.settings.always_on_top = !self.settings.always_on_top;
        self.persist(SettingKey::AlwaysOnTopState, self.settings.always_on_top);
        self.settings.always_on_top
    }

    pub fn toggle_sleepy(&mut self) -> bool {
        self.settings.sleepy = !self.settings.sleepy;
        self.persist(SettingKey::Sleepy, self.settings.sleepy);
        self.settings.sleepy
    }

    #[cfg(test)]
    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    fn persist<T: serde::Serialize>(&mut self, key: SettingKey, value: T) {
        if let Err(e) = self.store.set(key, value) {
            warn!("Failed to persist {}: {}", key.as_str(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn toggles_flip_and_report_new_value() {
        let mut state = AppState::new(SettingsStore::in_memory());
        assert!(state.toggle_inverted());
        assert!(!state.toggle_always_on_top());
        assert!(!state.toggle_sleepy());
        assert!(state.inverted());
        assert!(!state.always_on_top());
        assert!(!state.sleepy());
    }

    #[test]
    fn setters_write_through_to_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut state = AppState::new(SettingsStore::open(&path));
        state.set_window_size(480);
        state.toggle_sleepy();

        let reloaded = AppState::new(SettingsStore::open(&path));
        assert_eq!(reloaded.window_size(), 480);
        assert!(!reloaded.sleepy());
    }

    #[test]
    fn double_invert_persists_original_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut state = AppState::new(SettingsStore::open(&path));
        let original = state.inverted();
        state.toggle_inverted();
        state.toggle_inverted();
        assert_eq!(state.inverted(), original);

        let reloaded = SettingsStore::open(&path);
        assert_eq!(reloaded.get(SettingKey::InvertedState, !original), original);
    }
}
