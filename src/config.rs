//! Runtime configuration, read from an optional JSON file and overridden by
//! command-line flags.

use crate::error::ConfigError;
use crate::model::SiteSubtype;
use crate::permissions::Role;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Inventory snapshot seeding the local backend.
    pub dataset: Option<PathBuf>,
    /// Write every successful change back to `dataset`.
    pub persist: bool,
    pub role: Role,
    /// Subtype given to newly drawn sites.
    pub subtype: SiteSubtype,
    /// Without a log file no subscriber is installed.
    pub log_file: Option<PathBuf>,
    /// Used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Map cursor movement per key press, as a fraction of the visible width.
    pub cursor_step: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            persist: false,
            role: Role::Admin,
            subtype: SiteSubtype::OnStreet,
            log_file: None,
            log_filter: "info".to_string(),
            cursor_step: 0.02,
        }
    }
}

impl EditorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::FileRead {
            path: path_ref.to_path_buf(),
            source,
        })?;
        let config: EditorConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Invalid {
                path: path_ref.to_path_buf(),
                source,
            })?;
        config.validate()
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.cursor_step > 0.0 && self.cursor_step.is_finite() {
            Ok(self)
        } else {
            Err(ConfigError::InvalidCursorStep(self.cursor_step))
        }
    }
}
