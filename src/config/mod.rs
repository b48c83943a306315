//! Configuration module for Keepsake
//!
//! This module provides configuration management including:
//! - Platform path resolution
//! - The plaintext preferences document
//! - Typed settings stored inside the preferences

pub mod paths;
pub mod preferences;
pub mod settings;

pub use paths::KeepsakePaths;
pub use preferences::{PrefEntry, Preferences};
pub use settings::Settings;
