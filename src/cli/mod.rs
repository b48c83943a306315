//! CLI command handlers
//!
//! This module contains the implementation of CLI commands, bridging the
//! clap argument parsing in `main.rs` with the document core.

pub mod browse;
pub mod edit;
pub mod encrypt;
pub mod ledger;

pub use browse::{handle_get, handle_link, handle_search, handle_tree};
pub use edit::{handle_edit_command, EditCommand};
pub use encrypt::{handle_decrypt, handle_encrypt, Credentials};
pub use ledger::handle_ledger;

use std::path::Path;

use crate::config::{KeepsakePaths, Preferences, Settings};
use crate::crypto::KeyDerivationParams;
use crate::document::Document;
use crate::error::KeepsakeResult;
use crate::storage::Storage;

/// Everything a command needs: the open file plus the user's settings
#[derive(Debug)]
pub struct Workspace {
    pub storage: Storage,
    pub preferences: Preferences,
    pub settings: Settings,
}

impl Workspace {
    /// Load preferences and open the document file, unlocking it if needed
    pub fn open(paths: &KeepsakePaths, file: &Path, credentials: &Credentials) -> KeepsakeResult<Self> {
        Self::open_with(paths, file, credentials, KeyDerivationParams::default())
    }

    /// Open with explicit key derivation parameters
    pub fn open_with(
        paths: &KeepsakePaths,
        file: &Path,
        credentials: &Credentials,
        params: KeyDerivationParams,
    ) -> KeepsakeResult<Self> {
        let preferences = Preferences::load(paths.preferences_file())?;
        let settings = Settings::load(&preferences)?;

        let mut storage = Storage::open_with(file, params)?;
        if storage.is_locked() {
            let key = credentials.key()?;
            let salt = credentials.salt(&settings, file)?;
            storage.unlock(key.as_bytes(), salt.as_bytes())?;
        }

        Ok(Self {
            storage,
            preferences,
            settings,
        })
    }

    pub fn document(&self) -> KeepsakeResult<&Document> {
        self.storage.document()
    }

    pub fn document_mut(&mut self) -> KeepsakeResult<&mut Document> {
        self.storage.document_mut()
    }

    /// Write settings into the preferences file
    pub fn save_settings(&mut self) -> KeepsakeResult<()> {
        self.settings.store(&mut self.preferences)?;
        self.preferences.save()
    }
}
