//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::users::UsersCommand;
use crate::config::StoreArgs;

/// Manage users in a wide-column store.
#[derive(Parser, Debug)]
#[command(name = "userbase")]
#[command(author, version = env!("USERBASE_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// User operations
    Users(UsersCommand),
}
