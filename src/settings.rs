//! Persisted settings.
//!
//! The store is a flat JSON object on disk. Every `set` rewrites the file
//! immediately; absent or mistyped keys fall back to the caller's default.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::PetSize;

/// Renderer sleep-check period while the pet is allowed to doze.
pub const SLEEPY_CHECK_INTERVAL_MS: u64 = 60_000;
/// Renderer sleep-check period while sleep mode is off.
pub const AWAKE_CHECK_INTERVAL_MS: u64 = 600_000;

const APP_DIR: &str = "sharklepal";
const CONFIG_DIR_ENV: &str = "SHARKLEPAL_CONFIG_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    WindowSize,
    InvertedState,
    AlwaysOnTopState,
    Sleepy,
}

impl SettingKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::WindowSize => "windowSize",
            SettingKey::InvertedState => "invertedState",
            SettingKey::AlwaysOnTopState => "alwaysOnTopState",
            SettingKey::Sleepy => "sleepy",
        }
    }
}

/// Key-value store backed by a JSON file. A store without a path keeps
/// everything in memory.
#[derive(Debug, Default)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    values: Map<String, Value>,
}

impl SettingsStore {
    /// Open the store at `path`. Missing files start empty; unreadable or
    /// corrupt files are logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Map<String, Value>>(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Failed to parse settings at {:?}: {}. Using defaults.", path, e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {:?}, starting from defaults", path);
                Map::new()
            }
            Err(e) => {
                warn!("Failed to read settings at {:?}: {}. Using defaults.", path, e);
                Map::new()
            }
        };

        Self {
            path: Some(path),
            values,
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get<T: DeserializeOwned>(&self, key: SettingKey, default: T) -> T {
        self.values
            .get(key.as_str())
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or(default)
    }

    pub fn set<T: Serialize>(&mut self, key: SettingKey, value: T) -> Result<()> {
        self.values
            .insert(key.as_str().to_string(), serde_json::to_value(value)?);
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(path, json)?;

        Ok(())
    }
}

/// The four persisted settings, read once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppSettings {
    pub window_size: u32,
    pub inverted: bool,
    pub always_on_top: bool,
    pub sleepy: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            window_size: PetSize::DEFAULT.px(),
            inverted: false,
            always_on_top: true,
            sleepy: true,
        }
    }
}

impl AppSettings {
    pub fn load(store: &SettingsStore) -> Self {
        let defaults = Self::default();
        let window_size = store.get(SettingKey::WindowSize, defaults.window_size);

        Self {
            // A zero-sized window can never be clicked again
            window_size: if window_size == 0 {
                defaults.window_size
            } else {
                window_size
            },
            inverted: store.get(SettingKey::InvertedState, defaults.inverted),
            always_on_top: store.get(SettingKey::AlwaysOnTopState, defaults.always_on_top),
            sleepy: store.get(SettingKey::Sleepy, defaults.sleepy),
        }
    }

    pub fn sleep_check_interval_ms(&self) -> u64 {
        sleep_check_interval_ms(self.sleepy)
    }
}

pub fn sleep_check_interval_ms(sleepy: bool) -> u64 {
    if sleepy {
        SLEEPY_CHECK_INTERVAL_MS
    } else {
        AWAKE_CHECK_INTERVAL_MS
    }
}

/// Locations of the persisted files.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub settings: PathBuf,
    pub window_state: PathBuf,
}

impl ConfigPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            settings: dir.join("settings.json"),
            window_state: dir.join("window-state.json"),
        }
    }

    /// `$SHARKLEPAL_CONFIG_DIR`, else `<config dir>/sharklepal`.
    pub fn resolve() -> Self {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Self::in_dir(PathBuf::from(dir));
        }

        let mut dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push(APP_DIR);
        Self::in_dir(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_on_empty_store() {
        let store = SettingsStore::in_memory();
        let settings = AppSettings::load(&store);
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.window_size, 240);
        assert!(settings.always_on_top);
        assert!(settings.sleepy);
        assert!(!settings.inverted);
    }

    #[test]
    fn test_set_persists_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut store = SettingsStore::open(&path);
        store.set(SettingKey::WindowSize, 140u32).unwrap();
        store.set(SettingKey::InvertedState, true).unwrap();

        let reopened = SettingsStore::open(&path);
        let settings = AppSettings::load(&reopened);
        assert_eq!(settings.window_size, 140);
        assert!(settings.inverted);
        assert!(settings.sleepy);
    }

    #[test]
    fn test_file_uses_documented_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = SettingsStore::open(&path);
        store.set(SettingKey::AlwaysOnTopState, false).unwrap();
        store.set(SettingKey::Sleepy, false).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["alwaysOnTopState"], Value::Bool(false));
        assert_eq!(raw["sleepy"], Value::Bool(false));
    }

    #[test]
    fn test_unknown_keys_survive_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"petName": "Sharkie", "windowSize": 80}"#).unwrap();

        let mut store = SettingsStore::open(&path);
        assert_eq!(store.get(SettingKey::WindowSize, 240u32), 80);
        store.set(SettingKey::Sleepy, false).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["petName"], Value::String("Sharkie".to_string()));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::open(&path);
        assert_eq!(AppSettings::load(&store), AppSettings::default());
    }

    #[test]
    fn test_mistyped_value_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"windowSize": "huge", "invertedState": 1}"#).unwrap();

        let store = SettingsStore::open(&path);
        let settings = AppSettings::load(&store);
        assert_eq!(settings.window_size, 240);
        assert!(!settings.inverted);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let mut store = SettingsStore::in_memory();
        store.set(SettingKey::WindowSize, 0u32).unwrap();
        assert_eq!(AppSettings::load(&store).window_size, 240);
    }

    #[test]
    fn test_sleep_interval_follows_flag() {
        assert_eq!(sleep_check_interval_ms(true), SLEEPY_CHECK_INTERVAL_MS);
        assert_eq!(sleep_check_interval_ms(false), AWAKE_CHECK_INTERVAL_MS);
        assert_ne!(SLEEPY_CHECK_INTERVAL_MS, AWAKE_CHECK_INTERVAL_MS);
    }

    #[test]
    fn test_config_paths_share_directory() {
        let paths = ConfigPaths::in_dir("/tmp/sharkle");
        assert_eq!(paths.settings, PathBuf::from("/tmp/sharkle/settings.json"));
        assert_eq!(paths.window_state, PathBuf::from("/tmp/sharkle/window-state.json"));
    }
}
