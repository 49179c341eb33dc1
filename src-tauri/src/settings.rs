use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::registry::ModuleRegistry;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Key into each module's localized `names`.
    pub locale: String,
    /// Pointer travel in pixels before a press on a tab becomes a drag.
    pub drag_activation_distance: f32,
    /// Whether the recovery screen shows the collapsible diagnostic detail.
    pub show_error_details: bool,
    /// JSON module list replacing the built-in registry.
    pub modules_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            locale: "english".to_string(),
            drag_activation_distance: 8.0,
            show_error_details: true,
            modules_file: None,
        }
    }
}

impl Settings {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(SETTINGS_FILE)
    }

    #[cfg(feature = "desktop")]
    pub fn get_path(app: &tauri::AppHandle) -> Result<PathBuf> {
        use tauri::Manager;
        let dir = app
            .path()
            .app_data_dir()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;
        Ok(Self::path_in(&dir))
    }

    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    log::warn!("[Settings] Failed to parse settings: {}, returning defaults", e);
                    Self::default()
                }),
                Err(e) => {
                    log::warn!("[Settings] Failed to read file: {}, returning defaults", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp_path = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        // Write to tmp, then rename, so a crash never leaves a half-written file.
        fs::write(&tmp_path, json)?;
        fs::rename(tmp_path, path)?;

        Ok(())
    }

    /// Registry from `modules_file`, or the built-in one when unset or unreadable.
    pub fn module_registry(&self) -> ModuleRegistry {
        match &self.modules_file {
            Some(path) => ModuleRegistry::load(path).unwrap_or_else(|e| {
                log::warn!("[Settings] Module file {} rejected: {}, using built-in modules", path.display(), e);
                ModuleRegistry::builtin()
            }),
            None => ModuleRegistry::builtin(),
        }
    }
}
