//! Document editing CLI commands
//!
//! Every command here mutates the document and saves it with the
//! credentials it was opened with.

use clap::Subcommand;

use super::Workspace;
use crate::document::PATH_SEPARATOR;
use crate::error::{KeepsakeError, KeepsakeResult};
use crate::session::EditSession;

/// Commands that change the document
#[derive(Subcommand, Debug)]
pub enum EditCommand {
    /// Set the text of a leaf
    Set {
        /// Dotted path of the leaf
        path: String,
        /// New value; coerced to the leaf's type
        text: String,
    },
    /// Add a user with a starter hint and note
    AddUser {
        /// User name
        name: String,
    },
    /// Add an empty note to a user
    AddNote {
        /// Existing user
        user: String,
        /// Note name, optionally prefixed with ml!, rt! or po!
        name: String,
    },
    /// Add a password hint to a user
    AddHint {
        /// Existing user
        user: String,
        /// Application the hint is for
        app: String,
    },
    /// Rename the last segment of a path
    Rename {
        /// Dotted path to rename
        path: String,
        /// New key
        new_name: String,
    },
    /// Remove a subtree
    Remove {
        /// Dotted path to remove
        path: String,
        /// Siblings that must remain (defaults to the setting for users, 0 otherwise)
        #[arg(long)]
        min_remaining: Option<usize>,
    },
}

/// Handle an edit command and save the document
pub fn handle_edit_command(workspace: &mut Workspace, cmd: EditCommand) -> KeepsakeResult<()> {
    let changed = match cmd {
        EditCommand::Set { path, text } => set_leaf(workspace, path, text)?,
        EditCommand::AddUser { name } => {
            workspace.document_mut()?.add_user(&name)?;
            println!("Added user '{}'", name);
            true
        }
        EditCommand::AddNote { user, name } => {
            workspace.document_mut()?.add_note(&user, &name)?;
            println!("Added note '{}' to '{}'", name, user);
            true
        }
        EditCommand::AddHint { user, app } => {
            workspace.document_mut()?.add_hint(&user, &app)?;
            println!("Added hint '{}' to '{}'", app, user);
            true
        }
        EditCommand::Rename { path, new_name } => {
            let doc = workspace.document_mut()?;
            let node = doc.rename_path(&path, &new_name)?;
            let new_path = doc.path_of(node).unwrap_or_else(|| new_name.clone());
            println!("Renamed '{}' to '{}'", path, new_path);
            remap_last_path(workspace, &path, Some(&new_path))?;
            true
        }
        EditCommand::Remove {
            path,
            min_remaining,
        } => {
            let is_user = !path.contains(PATH_SEPARATOR);
            let floor = min_remaining.unwrap_or(if is_user {
                workspace.settings.min_remaining_users
            } else {
                0
            });
            workspace.document_mut()?.remove_path(&path, floor)?;
            println!("Removed '{}'", path);
            remap_last_path(workspace, &path, None)?;
            true
        }
    };

    if changed {
        workspace.storage.save()?;
    }
    Ok(())
}

/// Stage the text in an edit session and commit it
fn set_leaf(workspace: &mut Workspace, path: String, text: String) -> KeepsakeResult<bool> {
    let doc = workspace.document_mut()?;
    let mut session = EditSession::new();
    session.register_path(doc, &path)?;

    if !session.set_new(&path, &text)? {
        println!("'{}' is unchanged", path);
        return Ok(false);
    }

    if session.commit(doc) == 0 {
        let kind = session
            .entry(&path)
            .map(|entry| entry.kind.name())
            .unwrap_or("leaf");
        return Err(KeepsakeError::TypeCoercion { path, kind, text });
    }

    println!("Updated '{}'", path);
    Ok(true)
}

/// Follow a rename or removal in the remembered selection
fn remap_last_path(workspace: &mut Workspace, old: &str, new: Option<&str>) -> KeepsakeResult<()> {
    let Some(last) = workspace.settings.last_path.clone() else {
        return Ok(());
    };

    let rest = if last == old {
        Some("")
    } else {
        last.strip_prefix(old)
            .filter(|rest| rest.starts_with(PATH_SEPARATOR))
    };
    let Some(rest) = rest else {
        return Ok(());
    };

    workspace.settings.last_path = new.map(|new| format!("{}{}", new, rest));
    workspace.save_settings()
}
