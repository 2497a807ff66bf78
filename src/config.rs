use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{write_atomically, PimError, Result};

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding group files and defaults files
    pub data_dir: PathBuf,

    /// Directory for archives
    pub archive_dir: PathBuf,

    /// Maximum number of archives to keep, 0 keeps all
    pub max_archives: u32,

    /// Editor used for long-form note text
    pub editor_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let base = ProjectDirs::from("org", "pimgroups", "pim")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("pim-data"));

        Config {
            data_dir: base.join("groups"),
            archive_dir: base.join("archives"),
            max_archives: 10,
            editor_command: None,
        }
    }
}

impl Config {
    /// Where the configuration file lives when none is given on the command line.
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("org", "pimgroups", "pim")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("pim-config.json"))
    }

    /// Reads the configuration, or returns the defaults if the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| PimError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Rewrites the whole configuration file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|_| PimError::DirectoryError {
                    path: parent.to_path_buf(),
                })?;
            }
        }
        write_atomically(path, serde_json::to_string_pretty(self)?.as_bytes())?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Updates one setting from a `key=value` string.
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| PimError::ConfigError {
                message: format!("expected key=value, got '{}'", assignment),
            })?;
        let value = value.trim();

        match key.trim() {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "archive_dir" => self.archive_dir = PathBuf::from(value),
            "max_archives" => {
                self.max_archives = value.parse().map_err(|_| PimError::ConfigError {
                    message: format!("max_archives must be a number, got '{}'", value),
                })?
            }
            "editor_command" => {
                self.editor_command = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            other => {
                return Err(PimError::ConfigError {
                    message: format!("unknown setting '{}'", other),
                })
            }
        }
        Ok(())
    }

    // This method provides smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        // First try the configured editor
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        // Then try environment variable
        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        // Fall back to platform defaults
        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -t".to_string()
        } else {
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}
