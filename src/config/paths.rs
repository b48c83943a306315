//! Path management for Keepsake
//!
//! ## Path Resolution Order
//!
//! 1. `KEEPSAKE_DATA_DIR` environment variable (if set)
//! 2. The platform configuration directory from `directories`
//!    (`~/.config/keepsake` on Linux)

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{KeepsakeError, KeepsakeResult};

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "KEEPSAKE_DATA_DIR";

/// Manages all paths used by Keepsake
#[derive(Debug, Clone)]
pub struct KeepsakePaths {
    base_dir: PathBuf,
}

impl KeepsakePaths {
    /// Resolve the base directory from the environment or the platform default
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> KeepsakeResult<Self> {
        let base_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => ProjectDirs::from("", "", "keepsake")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    KeepsakeError::Config("Could not determine a configuration directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Create KeepsakePaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path to the preferences file
    pub fn preferences_file(&self) -> PathBuf {
        self.base_dir.join("preferences.json")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> KeepsakeResult<()> {
        std::fs::create_dir_all(&self.base_dir).map_err(|e| KeepsakeError::io(&self.base_dir, e))
    }
}
