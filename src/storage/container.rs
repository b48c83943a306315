//! File container for the secrets document
//!
//! Holds the raw bytes of the document file together with the key and salt
//! that were used to open it, so a later save can re-seal with the same
//! credentials.

use std::path::{Path, PathBuf};

use crate::crypto::{open_with, seal_with, KeyDerivationParams, SecureBytes};
use crate::document::Document;
use crate::error::{KeepsakeError, KeepsakeResult};

use super::file_io::{read_bytes, write_bytes_atomic};

/// The bytes of one document file plus the credentials retained for saving
#[derive(Debug)]
pub struct FileContainer {
    path: PathBuf,
    key: SecureBytes,
    salt: SecureBytes,
    content: Vec<u8>,
    is_empty: bool,
    params: KeyDerivationParams,
}

impl FileContainer {
    /// Read a container from disk
    ///
    /// An empty path yields a container holding the bootstrap document.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> KeepsakeResult<Self> {
        let path = path.as_ref();

        let (content, is_empty) = if path.as_os_str().is_empty() {
            (Document::bootstrap().serialize()?, true)
        } else {
            (read_bytes(path)?, false)
        };

        tracing::debug!(path = %path.display(), bytes = content.len(), "loaded container");

        Ok(Self {
            path: path.to_path_buf(),
            key: SecureBytes::default(),
            salt: SecureBytes::default(),
            content,
            is_empty,
            params: KeyDerivationParams::default(),
        })
    }

    /// Override the key derivation parameters (tests use a cheap cost)
    pub fn with_kdf_params(mut self, params: KeyDerivationParams) -> Self {
        self.params = params;
        self
    }

    /// The file this container reads from and writes to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point the container at a different file
    pub fn set_path<P: AsRef<Path>>(&mut self, path: P) {
        self.path = path.as_ref().to_path_buf();
    }

    /// The current bytes: plaintext once decrypted, otherwise as read
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Replace the bytes that the next store will write
    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
        self.is_empty = false;
    }

    /// True when the container was bootstrapped rather than read
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// True iff both a key and a salt are retained
    pub fn has_enc_key(&self) -> bool {
        !self.key.is_empty() && !self.salt.is_empty()
    }

    /// True iff the first non-whitespace byte opens a JSON object or array
    pub fn looks_like_raw_json(&self) -> bool {
        self.content
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'{' || *b == b'[')
    }

    /// Decrypt the content in place and retain the credentials
    pub fn decrypt_with(&mut self, key: &[u8], salt: &[u8]) -> KeepsakeResult<()> {
        let plaintext = self.open_content(key, salt)?;
        self.adopt_plaintext(plaintext, key, salt);
        Ok(())
    }

    /// Decrypt the content without touching the container
    pub fn open_content(&self, key: &[u8], salt: &[u8]) -> KeepsakeResult<Vec<u8>> {
        if self.is_empty {
            return Err(KeepsakeError::EmptyContainer);
        }
        open_with(key, salt, &self.content, &self.params)
    }

    /// Replace the sealed content with its plaintext and retain the credentials
    pub fn adopt_plaintext(&mut self, plaintext: Vec<u8>, key: &[u8], salt: &[u8]) {
        self.content = plaintext;
        self.key = SecureBytes::from(key);
        self.salt = SecureBytes::from(salt);
    }

    /// Seal the content with the given credentials and write it
    pub fn store_encrypted(&mut self, key: &[u8], salt: &[u8]) -> KeepsakeResult<()> {
        let sealed = seal_with(key, salt, &self.content, &self.params)?;
        self.write(&sealed)?;
        self.key = SecureBytes::from(key);
        self.salt = SecureBytes::from(salt);
        Ok(())
    }

    /// Forget any credentials and write the content as plain text
    pub fn store_plain(&mut self) -> KeepsakeResult<()> {
        self.key.clear();
        self.salt.clear();
        let content = std::mem::take(&mut self.content);
        let result = self.write(&content);
        self.content = content;
        result
    }

    /// Store encrypted when credentials are retained, plain otherwise
    pub fn store_with_retained_key(&mut self) -> KeepsakeResult<()> {
        if self.has_enc_key() {
            let key = self.key.clone();
            let salt = self.salt.clone();
            self.store_encrypted(&key, &salt)
        } else {
            self.store_plain()
        }
    }

    fn write(&self, bytes: &[u8]) -> KeepsakeResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(KeepsakeError::Validation(
                "No file path set for this document".into(),
            ));
        }
        write_bytes_atomic(&self.path, bytes)
    }
}
