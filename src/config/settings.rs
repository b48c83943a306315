//! Typed application settings
//!
//! Settings live inside the preferences document under the `keepsake`
//! object, so they share one file with anything else stored there.

use std::collections::BTreeMap;
use std::path::Path;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{Map, Value};

use super::preferences::{PrefEntry, Preferences};
use crate::crypto::SecureBytes;
use crate::error::{KeepsakeError, KeepsakeResult};

/// Preferences object holding the settings
pub const SETTINGS_SECTION: &str = "keepsake";

const MIN_REMAINING_USERS: &str = "minRemainingUsers";
const SEARCH_CASE_SENSITIVE: &str = "searchCaseSensitive";
const LAST_PATH: &str = "lastPath";
const SALT: &str = "salt";
const SALTS: &str = "salts";

/// User settings for Keepsake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Siblings that must remain when removing a user
    pub min_remaining_users: usize,

    /// Whether search matches case
    pub search_case_sensitive: bool,

    /// Last selected tree path
    pub last_path: Option<String>,

    /// Base64-encoded salt shared by files without their own entry
    pub salt: Option<String>,

    /// Base64-encoded salts keyed by encoded file path
    pub salts: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_remaining_users: 1,
            search_case_sensitive: false,
            last_path: None,
            salt: None,
            salts: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Read settings, using defaults for anything absent
    pub fn load(prefs: &Preferences) -> KeepsakeResult<Self> {
        let mut settings = Self::default();
        let field = |name: &str| prefs.get_text(&format!("{}.{}", SETTINGS_SECTION, name));

        if let Some(text) = field(MIN_REMAINING_USERS) {
            settings.min_remaining_users = text.parse().map_err(|_| {
                KeepsakeError::Config(format!("{} must be a whole number, got '{}'", MIN_REMAINING_USERS, text))
            })?;
        }
        if let Some(text) = field(SEARCH_CASE_SENSITIVE) {
            settings.search_case_sensitive = text.parse().map_err(|_| {
                KeepsakeError::Config(format!("{} must be true or false, got '{}'", SEARCH_CASE_SENSITIVE, text))
            })?;
        }
        settings.last_path = field(LAST_PATH);
        settings.salt = field(SALT);

        if let Some(PrefEntry::Node(Value::Object(entries))) =
            prefs.get(&format!("{}.{}", SETTINGS_SECTION, SALTS))
        {
            settings.salts = entries
                .into_iter()
                .filter_map(|(file, salt)| salt.as_str().map(|salt| (file, salt.to_string())))
                .collect();
        }

        Ok(settings)
    }

    /// Write settings back into the preferences document
    pub fn store(&self, prefs: &mut Preferences) -> KeepsakeResult<()> {
        prefs.put(SETTINGS_SECTION, MIN_REMAINING_USERS, self.min_remaining_users)?;
        prefs.put(SETTINGS_SECTION, SEARCH_CASE_SENSITIVE, self.search_case_sensitive)?;

        for (key, value) in [(LAST_PATH, &self.last_path), (SALT, &self.salt)] {
            match value {
                Some(text) => prefs.put(SETTINGS_SECTION, key, text.as_str())?,
                None => {
                    prefs.remove(&format!("{}.{}", SETTINGS_SECTION, key));
                }
            }
        }

        if self.salts.is_empty() {
            prefs.remove(&format!("{}.{}", SETTINGS_SECTION, SALTS));
        } else {
            let entries: Map<String, Value> = self
                .salts
                .iter()
                .map(|(file, salt)| (file.clone(), Value::String(salt.clone())))
                .collect();
            prefs.put(SETTINGS_SECTION, SALTS, Value::Object(entries))?;
        }
        Ok(())
    }

    /// Decode the shared salt
    pub fn salt_bytes(&self) -> KeepsakeResult<Option<SecureBytes>> {
        self.salt.as_deref().map(decode_salt).transpose()
    }

    /// Encode and remember the shared salt
    pub fn set_salt(&mut self, salt: &[u8]) {
        self.salt = Some(STANDARD.encode(salt));
    }

    /// The salt remembered for `file`, falling back to the shared one
    pub fn salt_for(&self, file: &Path) -> KeepsakeResult<Option<SecureBytes>> {
        match self.salts.get(&file_key(file)) {
            Some(encoded) => decode_salt(encoded).map(Some),
            None => self.salt_bytes(),
        }
    }

    /// Encode and remember the salt for `file`
    pub fn set_salt_for(&mut self, file: &Path, salt: &[u8]) {
        self.salts.insert(file_key(file), STANDARD.encode(salt));
    }

    /// Forget the salt for `file`; the shared salt is left alone
    pub fn forget_salt_for(&mut self, file: &Path) -> bool {
        self.salts.remove(&file_key(file)).is_some()
    }
}

fn decode_salt(encoded: &str) -> KeepsakeResult<SecureBytes> {
    STANDARD
        .decode(encoded)
        .map(SecureBytes::new)
        .map_err(|e| KeepsakeError::Config(format!("Stored salt is not valid base64: {}", e)))
}

/// Preference key for a file: its canonical path, encoded so it holds no dots
fn file_key(file: &Path) -> String {
    let canonical = std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
    URL_SAFE_NO_PAD.encode(canonical.to_string_lossy().as_bytes())
}
