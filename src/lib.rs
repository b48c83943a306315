//! Keepsake - password hints, notes and account ledgers in one file
//!
//! This library provides the core of the Keepsake secrets manager: a
//! per-user document of password hints, notes and account transactions,
//! stored as pretty-printed JSON and optionally sealed with a password.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `crypto`: scrypt key derivation and AES-256-GCM sealing
//! - `storage`: file container, atomic writes and the `Storage` coordinator
//! - `document`: the mutable document tree and its JSON codec
//! - `navigation`: the path index behind the tree view
//! - `search`: substring search over keys and text
//! - `session`: staged leaf edits and link detection
//! - `reports`: transaction ledgers with running balances
//! - `config`: paths, the preferences document and typed settings
//! - `cli`: command handlers used by the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use keepsake::storage::Storage;
//!
//! let mut storage = Storage::open("secrets.json")?;
//! storage.document_mut()?.add_user("alice")?;
//! storage.save()?;
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod document;
pub mod error;
pub mod navigation;
pub mod reports;
pub mod search;
pub mod session;
pub mod storage;

pub use error::{KeepsakeError, KeepsakeResult};
