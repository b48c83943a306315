//! Password-keyed sealing of opaque byte blobs
//!
//! The sealed layout is `nonce(12) || ciphertext || tag(16)` with no header.
//! The salt is never embedded: callers keep it out of band and must present
//! the same key and salt to open a blob.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use zeroize::Zeroizing;

use crate::error::{KeepsakeError, KeepsakeResult};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Length of the derived AES-256 key
const KEY_SIZE: usize = 32;

/// scrypt cost parameters
///
/// The defaults are part of the on-disk format. Files written with other
/// values cannot be opened with [`open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDerivationParams {
    /// log2 of the CPU/memory cost N
    pub log_n: u8,
    /// Block size
    pub r: u32,
    /// Parallelism
    pub p: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            log_n: 20, // N = 16384 * 64
            r: 8,
            p: 1,
        }
    }
}

impl KeyDerivationParams {
    /// Create params with specific values
    pub fn with_values(log_n: u8, r: u32, p: u32) -> Self {
        Self { log_n, r, p }
    }

    /// The scrypt N parameter
    pub fn cost(&self) -> u64 {
        1u64 << self.log_n
    }
}

fn derive_key(
    key: &[u8],
    salt: &[u8],
    params: &KeyDerivationParams,
) -> KeepsakeResult<Zeroizing<[u8; KEY_SIZE]>> {
    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_SIZE)
        .map_err(|e| KeepsakeError::Config(format!("Invalid scrypt parameters: {}", e)))?;

    let mut derived = Zeroizing::new([0u8; KEY_SIZE]);
    scrypt::scrypt(key, salt, &scrypt_params, &mut derived[..])
        .map_err(|e| KeepsakeError::Config(format!("Key derivation failed: {}", e)))?;

    Ok(derived)
}

fn check_inputs(key: &[u8], salt: &[u8]) -> KeepsakeResult<()> {
    if key.is_empty() {
        return Err(KeepsakeError::MissingKey);
    }
    if salt.is_empty() {
        return Err(KeepsakeError::MissingSalt);
    }
    Ok(())
}

/// Seal plaintext with the on-disk key derivation parameters
pub fn seal(key: &[u8], salt: &[u8], plaintext: &[u8]) -> KeepsakeResult<Vec<u8>> {
    seal_with(key, salt, plaintext, &KeyDerivationParams::default())
}

/// Open a blob produced by [`seal`]
pub fn open(key: &[u8], salt: &[u8], sealed: &[u8]) -> KeepsakeResult<Vec<u8>> {
    open_with(key, salt, sealed, &KeyDerivationParams::default())
}

/// Seal plaintext using explicit key derivation parameters
///
/// Generates a random nonce for each call, so sealing the same plaintext
/// twice yields different blobs.
pub fn seal_with(
    key: &[u8],
    salt: &[u8],
    plaintext: &[u8],
    params: &KeyDerivationParams,
) -> KeepsakeResult<Vec<u8>> {
    check_inputs(key, salt)?;

    let derived = derive_key(key, salt, params)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived[..]));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| KeepsakeError::Validation(format!("Encryption failed: {}", e)))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);

    tracing::debug!(bytes = sealed.len(), "sealed document");
    Ok(sealed)
}

/// Open a sealed blob using explicit key derivation parameters
pub fn open_with(
    key: &[u8],
    salt: &[u8],
    sealed: &[u8],
    params: &KeyDerivationParams,
) -> KeepsakeResult<Vec<u8>> {
    check_inputs(key, salt)?;

    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(KeepsakeError::BadKeyOrCorrupt);
    }

    let derived = derive_key(key, salt, params)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived[..]));

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| KeepsakeError::BadKeyOrCorrupt)?;

    tracing::debug!(bytes = plaintext.len(), "opened document");
    Ok(plaintext)
}
