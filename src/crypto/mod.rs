//! Cryptographic functions for Keepsake
//!
//! Provides AES-256-GCM sealing with scrypt key derivation for optional
//! at-rest encryption of the secrets document.

pub mod secure_memory;
pub mod vault;

pub use secure_memory::{SecureBytes, SecureString};
pub use vault::{open, open_with, seal, seal_with, KeyDerivationParams, NONCE_SIZE, TAG_SIZE};
