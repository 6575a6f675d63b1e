//! Light/dark theme preference.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::events::{EventBus, StoreEvent};
use crate::storage::{KeyValueStore, StorageExt};

/// Storage key for the theme preference.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Dark => "dark",
        })
    }
}

/// The persisted theme preference.
pub struct ThemeSettings {
    storage: Arc<dyn KeyValueStore>,
    events: Option<Arc<EventBus>>,
    current: Theme,
}

impl ThemeSettings {
    /// Load the stored theme, defaulting to light.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let current = storage.load_json_or(THEME_KEY, Theme::default());
        Self {
            storage,
            events: None,
            current,
        }
    }

    #[must_use]
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    #[must_use]
    pub const fn current(&self) -> Theme {
        self.current
    }

    /// Switch between light and dark; returns the new theme.
    pub fn toggle(&mut self) -> Theme {
        self.set(self.current.toggled());
        self.current
    }

    pub fn set(&mut self, theme: Theme) {
        self.current = theme;
        if let Err(e) = self.storage.save_json(THEME_KEY, &theme) {
            tracing::warn!(error = %e, "Failed to persist theme");
        }
        if let Some(bus) = &self.events {
            bus.emit(&StoreEvent::ThemeChanged { theme });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_defaults_to_light() {
        let settings = ThemeSettings::load(Arc::new(MemoryStorage::new().context()));
        assert_eq!(settings.current(), Theme::Light);
    }

    #[test]
    fn test_toggle_persists() {
        let area = MemoryStorage::new();
        let storage = Arc::new(area.context());
        let mut settings = ThemeSettings::load(storage.clone());

        assert_eq!(settings.toggle(), Theme::Dark);
        assert_eq!(storage.get_item(THEME_KEY).unwrap().as_deref(), Some("\"dark\""));

        let reloaded = ThemeSettings::load(Arc::new(area.context()));
        assert_eq!(reloaded.current(), Theme::Dark);
        assert_eq!(reloaded.current().to_string(), "dark");
    }

    #[test]
    fn test_unknown_stored_theme_falls_back() {
        let storage = Arc::new(MemoryStorage::new().context());
        storage.set_item(THEME_KEY, "\"sepia\"").unwrap();
        assert_eq!(ThemeSettings::load(storage).current(), Theme::Light);
    }
}
