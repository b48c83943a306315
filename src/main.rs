use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use keepsake::cli::{
    handle_decrypt, handle_edit_command, handle_encrypt, handle_get, handle_ledger, handle_link,
    handle_search, handle_tree, Credentials, EditCommand, Workspace,
};
use keepsake::config::KeepsakePaths;

#[derive(Parser)]
#[command(
    name = "keepsake",
    author = "Kaylee Beyene",
    version,
    about = "Encrypted store for password hints, notes and account ledgers",
    long_about = "Keepsake keeps a per-user tree of password hints, notes and \
                  account transactions in a single JSON file, optionally sealed \
                  with a password using scrypt and AES-256-GCM."
)]
struct Cli {
    /// Document file to open (not needed for `link`)
    file: Option<PathBuf>,

    /// Password for an encrypted file
    #[arg(long, env = "KEEPSAKE_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Salt for an encrypted file (defaults to the remembered one)
    #[arg(long, env = "KEEPSAKE_SALT", hide_env_values = true, global = true)]
    salt: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the navigation tree
    Tree,

    /// Show a leaf's text or a subtree
    Get {
        /// Dotted path below groups
        path: String,
    },

    /// Search keys and text
    Search {
        /// Text to look for
        needle: String,
        /// Match case exactly
        #[arg(short, long)]
        case_sensitive: bool,
    },

    #[command(flatten)]
    Edit(EditCommand),

    /// Show an account's transactions with a running balance
    Ledger {
        /// Dotted path of the account
        path: String,
        /// Balance before the first transaction
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        initial: f64,
    },

    /// Encrypt the file with a password
    Encrypt,

    /// Store the file as plain text
    Decrypt,

    /// Print the first http(s) link in some text
    Link {
        /// Text to scan
        text: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(Commands::Link { text }) = &cli.command {
        handle_link(text);
        return Ok(());
    }

    let Some(file) = cli.file else {
        bail!("A document FILE is required for this command");
    };

    let paths = KeepsakePaths::new()?;
    let credentials = Credentials::new(cli.password, cli.salt);
    let mut workspace = Workspace::open(&paths, &file, &credentials)?;

    match cli.command {
        None | Some(Commands::Tree) => handle_tree(&workspace)?,
        Some(Commands::Get { path }) => handle_get(&mut workspace, &path)?,
        Some(Commands::Search {
            needle,
            case_sensitive,
        }) => handle_search(&workspace, &needle, case_sensitive)?,
        Some(Commands::Edit(cmd)) => handle_edit_command(&mut workspace, cmd)?,
        Some(Commands::Ledger { path, initial }) => handle_ledger(&workspace, &path, initial)?,
        Some(Commands::Encrypt) => handle_encrypt(&mut workspace, &credentials)?,
        Some(Commands::Decrypt) => handle_decrypt(&mut workspace)?,
        Some(Commands::Link { .. }) => {}
    }

    Ok(())
}
