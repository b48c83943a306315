//! Ledger CLI command

use super::Workspace;
use crate::error::KeepsakeResult;
use crate::reports::TransactionView;

/// Print the running-balance ledger for the account at `path`
pub fn handle_ledger(workspace: &Workspace, path: &str, initial: f64) -> KeepsakeResult<()> {
    let view = TransactionView::from_document(workspace.document()?, path, initial)?;

    println!("Transactions: {}", path);
    println!("{}", "=".repeat(64));
    print!("{}", view.format_terminal());

    let errors = view.errors().count();
    if errors > 0 {
        println!();
        println!("{} transaction(s) could not be read and count as zero.", errors);
    }
    Ok(())
}
