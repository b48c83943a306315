//! Storage layer for Keepsake
//!
//! Ties the file container to the parsed document: load, optionally
//! decrypt, parse, and later serialize and write back with the same
//! credentials.

pub mod container;
pub mod file_io;

pub use container::FileContainer;
pub use file_io::{read_bytes, write_bytes_atomic};

use std::path::Path;

use crate::crypto::KeyDerivationParams;
use crate::document::Document;
use crate::error::{KeepsakeError, KeepsakeResult};

/// An open document file
#[derive(Debug)]
pub struct Storage {
    container: FileContainer,
    document: Option<Document>,
}

impl Storage {
    /// Open a document file
    ///
    /// Plain files are parsed straight away. Anything that does not parse
    /// as JSON is treated as encrypted and stays locked until
    /// [`Storage::unlock`] succeeds. An empty path opens the bootstrap
    /// document.
    pub fn open<P: AsRef<Path>>(path: P) -> KeepsakeResult<Self> {
        Self::open_with(path, KeyDerivationParams::default())
    }

    /// Open with explicit key derivation parameters
    pub fn open_with<P: AsRef<Path>>(path: P, params: KeyDerivationParams) -> KeepsakeResult<Self> {
        let container = FileContainer::load_from_path(path)?.with_kdf_params(params);

        let document = match plain_json(&container) {
            Some(json) => Some(Document::from_json(json)?),
            None => {
                tracing::debug!(path = %container.path().display(), "content is encrypted, waiting for key");
                None
            }
        };

        Ok(Self {
            container,
            document,
        })
    }

    /// True until an encrypted file has been decrypted
    pub fn is_locked(&self) -> bool {
        self.document.is_none()
    }

    /// True when saves will be encrypted
    pub fn is_encrypted(&self) -> bool {
        self.container.has_enc_key()
    }

    /// Decrypt and parse a locked file
    pub fn unlock(&mut self, key: &[u8], salt: &[u8]) -> KeepsakeResult<()> {
        if !self.is_locked() {
            return Ok(());
        }
        let plaintext = self.container.open_content(key, salt)?;
        let document = Document::parse(&plaintext)?;
        self.container.adopt_plaintext(plaintext, key, salt);
        self.document = Some(document);
        tracing::debug!(path = %self.container.path().display(), "unlocked document");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.container.path()
    }

    pub fn container(&self) -> &FileContainer {
        &self.container
    }

    pub fn document(&self) -> KeepsakeResult<&Document> {
        self.document.as_ref().ok_or(KeepsakeError::MissingKey)
    }

    pub fn document_mut(&mut self) -> KeepsakeResult<&mut Document> {
        self.document.as_mut().ok_or(KeepsakeError::MissingKey)
    }

    /// Refresh the timestamp and write with the retained credentials
    pub fn save(&mut self) -> KeepsakeResult<()> {
        self.stage()?;
        self.container.store_with_retained_key()?;
        tracing::debug!(path = %self.path().display(), encrypted = self.is_encrypted(), "saved document");
        Ok(())
    }

    /// Write encrypted with new credentials, which are kept for later saves
    pub fn save_encrypted(&mut self, key: &[u8], salt: &[u8]) -> KeepsakeResult<()> {
        self.stage()?;
        self.container.store_encrypted(key, salt)?;
        tracing::info!(path = %self.path().display(), "document encrypted");
        Ok(())
    }

    /// Write plain text and drop any retained credentials
    pub fn save_plain(&mut self) -> KeepsakeResult<()> {
        self.stage()?;
        self.container.store_plain()?;
        tracing::info!(path = %self.path().display(), "document stored as plain text");
        Ok(())
    }

    fn stage(&mut self) -> KeepsakeResult<()> {
        let document = self.document_mut()?;
        document.touch_timestamp();
        let bytes = document.serialize()?;
        self.container.set_content(bytes);
        Ok(())
    }
}

/// The content as JSON, or `None` when it has to be decrypted first
///
/// Sealed bytes can start with `{` by chance, so a failed parse after a
/// positive sniff also counts as encrypted.
fn plain_json(container: &FileContainer) -> Option<serde_json::Value> {
    if !container.looks_like_raw_json() {
        return None;
    }
    match serde_json::from_slice(container.content()) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::debug!(error = %e, "content looks like JSON but does not parse");
            None
        }
    }
}
