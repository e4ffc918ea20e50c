//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/rowform/config.toml)
//! 3. Environment variables (ROWFORM_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "ROWFORM";

/// Per-direction enable switches for the six sync handlers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerToggles {
    pub header_to_form: bool,
    pub editor_to_form: bool,
    pub form_to_editor: bool,
    pub form_to_header: bool,
    pub cursor_to_row_field: bool,
    pub row_field_to_cursor: bool,
}

impl Default for HandlerToggles {
    fn default() -> Self {
        Self {
            header_to_form: true,
            editor_to_form: true,
            form_to_editor: true,
            form_to_header: true,
            cursor_to_row_field: true,
            row_field_to_cursor: true,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Per-handler enable switches
    pub handlers: HandlerToggles,

    /// Per-handler throttle window in milliseconds (0 disables)
    pub debounce_ms: u64,

    /// Trailing coalescing window for form field edits in milliseconds
    pub field_debounce_ms: u64,

    /// How long the loop guards stay up after a sync write completes.
    /// Must outlast the host's change-notification latency.
    pub guard_hold_ms: u64,

    /// Interval of the coordinator's stranded-event poll timer
    pub queue_poll_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            handlers: HandlerToggles::default(),
            debounce_ms: 50,
            field_debounce_ms: 300,
            guard_hold_ms: 50,
            queue_poll_ms: 10,
        }
    }
}

impl SyncConfig {
    /// Load configuration from the default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (ROWFORM_FIELD_DEBOUNCE_MS, ...)
    /// 2. Config file (~/.config/rowform/config.toml or ROWFORM_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides. If the file
    /// doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: SyncConfig =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// A config with every timing window zeroed; used by tests and by the
    /// replay harness where wall-clock coalescing only gets in the way
    pub fn immediate() -> Self {
        Self {
            debounce_ms: 0,
            field_debounce_ms: 0,
            guard_hold_ms: 0,
            ..Self::default()
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Some(val) = env_u64("DEBOUNCE_MS") {
            self.debounce_ms = val;
        }
        if let Some(val) = env_u64("FIELD_DEBOUNCE_MS") {
            self.field_debounce_ms = val;
        }
        if let Some(val) = env_u64("GUARD_HOLD_MS") {
            self.guard_hold_ms = val;
        }
        if let Some(val) = env_u64("QUEUE_POLL_MS") {
            self.queue_poll_ms = val;
        }
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with the ROWFORM_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rowform")
            .join("config.toml")
    }

    /// Whether the named handler is enabled
    pub fn handler_enabled(&self, name: &str) -> bool {
        match name {
            "HeaderToForm" => self.handlers.header_to_form,
            "EditorToForm" => self.handlers.editor_to_form,
            "FormToEditor" => self.handlers.form_to_editor,
            "FormToHeader" => self.handlers.form_to_header,
            "CursorToRowField" => self.handlers.cursor_to_row_field,
            "RowFieldToCursor" => self.handlers.row_field_to_cursor,
            _ => false,
        }
    }
}

fn env_u64(suffix: &str) -> Option<u64> {
    std::env::var(format!("{}_{}", ENV_PREFIX, suffix))
        .ok()
        .and_then(|v| v.parse().ok())
}
