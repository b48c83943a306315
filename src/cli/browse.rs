//! Read-only CLI commands
//!
//! Tree outline, single-path lookup, search and link extraction.

use super::Workspace;
use crate::error::KeepsakeResult;
use crate::search::search;
use crate::session::parse_first_link;
use crate::storage::file_io::to_pretty_json;

/// Print the navigation outline and the remembered selection
pub fn handle_tree(workspace: &Workspace) -> KeepsakeResult<()> {
    let nav = workspace.document()?.nav();
    print!("{}", nav.outline());

    let current = workspace.settings.last_path.as_deref().unwrap_or_default();
    let selected = nav.resolve_initial(current);
    if !selected.is_empty() {
        println!();
        println!("Selected: {}", selected);
    }
    Ok(())
}

/// Print a leaf's text or a subtree as JSON, and remember the selection
pub fn handle_get(workspace: &mut Workspace, path: &str) -> KeepsakeResult<()> {
    let doc = workspace.document()?;
    let node = doc.find_by_path(path)?;

    match doc.leaf_text(node) {
        Some(text) => println!("{}", text),
        None => {
            let snapshot = doc.snapshot(node)?;
            println!("{}", String::from_utf8_lossy(&to_pretty_json(&snapshot)?));
        }
    }

    if workspace.settings.last_path.as_deref() != Some(path) {
        workspace.settings.last_path = Some(path.to_string());
        workspace.save_settings()?;
    }
    Ok(())
}

/// Print every search hit as `path<TAB>description`
pub fn handle_search(workspace: &Workspace, needle: &str, case_sensitive: bool) -> KeepsakeResult<()> {
    let case_sensitive = case_sensitive || workspace.settings.search_case_sensitive;
    let mut count = 0;

    search(workspace.document()?, needle, case_sensitive, |hit| {
        println!("{}\t{}", hit.path, hit.description);
        count += 1;
    });

    if count == 0 {
        println!("No matches for '{}'.", needle);
    }
    Ok(())
}

/// Print the first link found in `text`
pub fn handle_link(text: &str) {
    match parse_first_link(text) {
        Some(link) => println!("{}", link),
        None => println!("No link found."),
    }
}
