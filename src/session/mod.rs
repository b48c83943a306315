//! Pending edits awaiting a batch commit
//!
//! Collaborators register the leaves they display, stage text changes
//! against them, and commit the batch into the live document. Commit is the
//! only path by which staged text reaches the document.

pub mod entry;
pub mod link;

pub use entry::{EditEntry, EditSession};
pub use link::parse_first_link;
