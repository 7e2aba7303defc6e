//! User preferences and tunable thresholds

use crate::error::{DesksweepError, Result};
use crate::suggest::SuggestionThresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Preferences {
    /// Collect Bin decisions for an end-of-session review pass instead of
    /// trashing immediately.
    pub deferred_bin: bool,
    #[serde(default)]
    pub thresholds: SuggestionThresholds,
}

impl Preferences {
    /// Config file path (~/.config/desksweep/config.json)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("desksweep").join("config.json"))
    }

    /// Load preferences from file, or defaults when none exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok_or_else(|| {
            DesksweepError::Config("Could not determine config directory".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            DesksweepError::Config(format!("Failed to read config file: {}", e))
        })?;

        serde_json::from_str(&contents)
            .map_err(|e| DesksweepError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Save preferences to file.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or_else(|| {
            DesksweepError::Config("Could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DesksweepError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| DesksweepError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&path, contents)
            .map_err(|e| DesksweepError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences() {
        let prefs = Preferences::default();
        assert!(!prefs.deferred_bin);
        assert_eq!(prefs.thresholds.comparison_window, 100);
        assert_eq!(prefs.thresholds.old_after_days, 90);
        assert_eq!(prefs.thresholds.large_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_preferences_serialization_round_trip() {
        let prefs = Preferences {
            deferred_bin: true,
            thresholds: SuggestionThresholds {
                old_after_days: 30,
                ..SuggestionThresholds::default()
            },
        };

        let json = serde_json::to_string(&prefs).unwrap();
        let back: Preferences = serde_json::from_str(&json).unwrap();

        assert!(back.deferred_bin);
        assert_eq!(back.thresholds.old_after_days, 30);
    }

    #[test]
    fn test_missing_thresholds_fall_back_to_defaults() {
        let back: Preferences = serde_json::from_str(r#"{"deferred_bin":true}"#).unwrap();
        assert!(back.deferred_bin);
        assert_eq!(back.thresholds.similar_min_group, 3);
    }
}
