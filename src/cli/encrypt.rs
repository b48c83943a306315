//! Encryption CLI commands
//!
//! Switches a document file between encrypted and plain storage and
//! resolves the password and salt used to open it.

use std::path::Path;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;

use super::Workspace;
use crate::config::Settings;
use crate::crypto::{SecureBytes, SecureString};
use crate::error::{KeepsakeError, KeepsakeResult};

/// Size of a freshly generated salt
pub const SALT_SIZE: usize = 32;

/// Shortest passphrase accepted when choosing a new one interactively
const MIN_PASSPHRASE_LEN: usize = 8;

/// Password and salt given on the command line or in the environment
#[derive(Debug, Default)]
pub struct Credentials {
    password: Option<SecureString>,
    salt: Option<SecureBytes>,
}

impl Credentials {
    pub fn new(password: Option<String>, salt: Option<String>) -> Self {
        Self {
            password: password.map(SecureString::from),
            salt: salt.map(|s| SecureBytes::new(s.into_bytes())),
        }
    }

    /// The password, prompting for it when none was given
    pub fn key(&self) -> KeepsakeResult<SecureString> {
        match &self.password {
            Some(password) => Ok(password.clone()),
            None => prompt_passphrase("Password: "),
        }
    }

    /// The password for a new encryption, prompting twice when none was given
    pub fn new_key(&self) -> KeepsakeResult<SecureString> {
        match &self.password {
            Some(password) => Ok(password.clone()),
            None => prompt_new_passphrase(),
        }
    }

    /// The explicit salt, or the one remembered in settings for `file`
    pub fn salt(&self, settings: &Settings, file: &Path) -> KeepsakeResult<SecureBytes> {
        if let Some(salt) = &self.salt {
            return Ok(salt.clone());
        }
        settings.salt_for(file)?.ok_or(KeepsakeError::MissingSalt)
    }
}

/// Encrypt the document file, remembering the salt in settings
///
/// The salt is saved before the file is sealed, so a failed settings write
/// leaves the file in plain text.
pub fn handle_encrypt(workspace: &mut Workspace, credentials: &Credentials) -> KeepsakeResult<()> {
    let file = workspace.storage.path().to_path_buf();
    let salt = match credentials.salt(&workspace.settings, &file) {
        Ok(salt) => salt,
        Err(KeepsakeError::MissingSalt) => generate_salt(),
        Err(e) => return Err(e),
    };
    let key = credentials.new_key()?;

    workspace.settings.set_salt_for(&file, salt.as_bytes());
    workspace.save_settings()?;

    println!("Deriving encryption key...");
    workspace
        .storage
        .save_encrypted(key.as_bytes(), salt.as_bytes())?;

    println!("Encrypted {}", workspace.storage.path().display());
    println!("Keep your password safe - there is no recovery mechanism!");
    Ok(())
}

/// Store the document file as plain text
pub fn handle_decrypt(workspace: &mut Workspace) -> KeepsakeResult<()> {
    if !workspace.storage.is_encrypted() {
        println!("{} is not encrypted.", workspace.storage.path().display());
        return Ok(());
    }

    workspace.storage.save_plain()?;
    let file = workspace.storage.path().to_path_buf();
    if workspace.settings.forget_salt_for(&file) {
        workspace.save_settings()?;
    }

    println!("Decrypted {}", workspace.storage.path().display());
    Ok(())
}

fn generate_salt() -> SecureBytes {
    let mut salt = vec![0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    SecureBytes::new(salt)
}

/// Prompt for a new passphrase with confirmation
fn prompt_new_passphrase() -> KeepsakeResult<SecureString> {
    loop {
        let first = prompt_passphrase("Enter new password: ")?;

        if first.chars().count() < MIN_PASSPHRASE_LEN {
            println!(
                "Password must be at least {} characters. Please try again.",
                MIN_PASSPHRASE_LEN
            );
            continue;
        }

        let second = prompt_passphrase("Confirm password: ")?;

        if first.as_str() != second.as_str() {
            println!("Passwords do not match. Please try again.");
            continue;
        }

        return Ok(first);
    }
}

/// Prompt for a passphrase (hidden input)
fn prompt_passphrase(prompt: &str) -> KeepsakeResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::from)
        .map_err(|e| KeepsakeError::io("<terminal>", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeepsakePaths, Preferences};
    use crate::crypto::KeyDerivationParams;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SAMPLE: &str =
        r#"{"timeStamp":"Fri Jul 30 21:25:10 BST 2021","groups":{"UserA":{"notes":{"note":"hi"}}}}"#;

    fn fast() -> KeyDerivationParams {
        KeyDerivationParams::with_values(4, 8, 1)
    }

    fn write_sample(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, SAMPLE).unwrap();
        path
    }

    fn open(paths: &KeepsakePaths, file: &Path, credentials: &Credentials) -> Workspace {
        Workspace::open_with(paths, file, credentials, fast()).unwrap()
    }

    #[test]
    fn test_explicit_credentials() {
        let credentials = Credentials::new(Some("hunter22".into()), Some("pepper".into()));
        assert_eq!(credentials.key().unwrap().as_str(), "hunter22");
        assert_eq!(credentials.new_key().unwrap().as_str(), "hunter22");
        assert_eq!(
            credentials
                .salt(&Settings::default(), Path::new("any.json"))
                .unwrap()
                .as_bytes(),
            b"pepper"
        );
    }

    #[test]
    fn test_salt_falls_back_to_settings() {
        let credentials = Credentials::new(Some("pw".into()), None);
        let file = Path::new("keepsake.json");
        assert!(matches!(
            credentials.salt(&Settings::default(), file),
            Err(KeepsakeError::MissingSalt)
        ));

        let mut settings = Settings::load(&Preferences::new("unused.json")).unwrap();
        settings.set_salt(b"stored");
        assert_eq!(credentials.salt(&settings, file).unwrap().as_bytes(), b"stored");

        settings.set_salt_for(file, b"own");
        assert_eq!(credentials.salt(&settings, file).unwrap().as_bytes(), b"own");
    }

    #[test]
    fn test_generated_salts_differ() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), SALT_SIZE);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_decrypting_one_file_keeps_the_other_openable() {
        let temp_dir = TempDir::new().unwrap();
        let paths = KeepsakePaths::with_base_dir(temp_dir.path().join("config"));
        let a = write_sample(&temp_dir, "a.json");
        let b = write_sample(&temp_dir, "b.json");
        let credentials = Credentials::new(Some("correct horse".into()), None);

        handle_encrypt(&mut open(&paths, &a, &credentials), &credentials).unwrap();
        handle_encrypt(&mut open(&paths, &b, &credentials), &credentials).unwrap();

        let mut workspace = open(&paths, &a, &credentials);
        handle_decrypt(&mut workspace).unwrap();
        assert!(std::fs::read(&a).unwrap().starts_with(b"{"));

        let workspace = open(&paths, &b, &credentials);
        assert_eq!(workspace.document().unwrap().users(), vec!["UserA".to_string()]);
        assert!(workspace.storage.is_encrypted());
    }

    #[test]
    fn test_encrypt_leaves_file_plain_when_settings_cannot_be_saved() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let paths = KeepsakePaths::with_base_dir(blocker.join("config"));

        let file = write_sample(&temp_dir, "keepsake.json");
        let credentials = Credentials::new(Some("correct horse".into()), None);
        let mut workspace = open(&paths, &file, &credentials);

        assert!(handle_encrypt(&mut workspace, &credentials).is_err());
        assert!(std::fs::read(&file).unwrap().starts_with(b"{"));
        assert!(!workspace.storage.is_encrypted());
    }
}
