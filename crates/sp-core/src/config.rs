//! Editor configuration loaded from `stylepad.toml`.

use crate::constants;
use crate::error::EditorError;
use crate::error::EditorResult;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "stylepad.toml";
const CONFIG_PATH_ENV: &str = "STYLEPAD_CONFIG";
const SYNC_GUARD_ENV: &str = "STYLEPAD_SYNC_GUARD_MS";
const MAX_SYNC_GUARD_MS: u64 = 10_000;

/// Runtime hardening knobs for the component sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeLimits {
    pub recursion_limit: usize,
    pub stack_size_limit: usize,
    pub loop_iteration_limit: u64,
}

impl Default for RuntimeLimits {
    fn default() -> Self {
        Self {
            recursion_limit: 256,
            stack_size_limit: 10 * 1024,
            loop_iteration_limit: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// How long a patched source is shielded from re-synchronization.
    pub sync_guard_ms: u64,
    pub preview_root_class: String,
    pub popover_class: String,
    pub popover_offset_y: f32,
    /// Pseudo-path used for syntax detection (`.tsx`, `.ts`, `.jsx`, `.js`).
    pub component_filename: String,
    pub max_source_bytes: usize,
    pub runtime: RuntimeLimits,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            sync_guard_ms: constants::SYNC_GUARD_WINDOW.as_millis() as u64,
            preview_root_class: constants::PREVIEW_ROOT_CLASS.to_owned(),
            popover_class: constants::POPOVER_CLASS.to_owned(),
            popover_offset_y: constants::POPOVER_OFFSET_Y,
            component_filename: constants::COMPONENT_FILENAME.to_owned(),
            max_source_bytes: 512 * 1024,
            runtime: RuntimeLimits::default(),
        }
    }
}

impl EditorConfig {
    /// Loads the config from `STYLEPAD_CONFIG` or `./stylepad.toml`, falling
    /// back to defaults when neither exists, then applies env overrides.
    pub fn load() -> EditorResult<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        if let Ok(raw) = std::env::var(SYNC_GUARD_ENV) {
            config.sync_guard_ms = raw.trim().parse().map_err(|_| {
                EditorError::config(format!("{SYNC_GUARD_ENV} must be an integer, got `{raw}`"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> EditorResult<Self> {
        let content = fs::read_to_string(path).map_err(|error| EditorError::Io {
            path: path.display().to_string(),
            message: error.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> EditorResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|error| EditorError::config(error.message().to_owned()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EditorResult<()> {
        if self.sync_guard_ms > MAX_SYNC_GUARD_MS {
            return Err(EditorError::config(format!(
                "sync_guard_ms must be at most {MAX_SYNC_GUARD_MS}"
            )));
        }

        if self.preview_root_class.trim().is_empty() {
            return Err(EditorError::config("preview_root_class must not be empty"));
        }

        if self.max_source_bytes == 0 {
            return Err(EditorError::config(
                "max_source_bytes must be greater than zero",
            ));
        }

        Ok(())
    }

    pub fn sync_guard_window(&self) -> Duration {
        Duration::from_millis(self.sync_guard_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::EditorConfig;

    #[test]
    fn defaults_match_editor_constants() {
        let config = EditorConfig::default();
        assert_eq!(config.sync_guard_ms, 100);
        assert_eq!(config.preview_root_class, "preview-content");
        assert_eq!(config.component_filename, "component.tsx");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config = EditorConfig::from_toml(
            "sync_guard_ms = 250\n[runtime]\nloop_iteration_limit = 5000\n",
        );
        let Ok(config) = config else {
            panic!("config should parse");
        };
        assert_eq!(config.sync_guard_ms, 250);
        assert_eq!(config.runtime.loop_iteration_limit, 5000);
        assert_eq!(config.runtime.recursion_limit, 256);
        assert_eq!(config.popover_class, "style-editor-popover");
    }

    #[test]
    fn rejects_oversized_guard_window() {
        let config = EditorConfig::from_toml("sync_guard_ms = 60000");
        assert!(config.is_err());
        if let Err(error) = config {
            assert_eq!(error.code(), "config.invalid");
        }
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(EditorConfig::from_toml("sync_guard_ms = [").is_err());
    }
}
