//! Get user command implementation.

use anyhow::{Context, Result};
use clap::Args;

use userbase_core::UserRepository;
use userbase_file::FileClient;

use crate::output;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// User id
    pub id: String,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: GetArgs, repo: &UserRepository<FileClient>) -> Result<()> {
    let id = super::parse_id(&args.id)?;
    let user = repo
        .find_by_id(&id)
        .await
        .with_context(|| format!("Failed to get user {}", id))?;
    output::value(&user, args.pretty)
}
