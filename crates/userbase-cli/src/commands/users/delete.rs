//! Delete user command implementation.

use anyhow::{Context, Result};
use clap::Args;

use userbase_core::UserRepository;
use userbase_file::FileClient;

use crate::output;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// User id
    pub id: String,
}

pub async fn run(args: DeleteArgs, repo: &UserRepository<FileClient>) -> Result<()> {
    let id = super::parse_id(&args.id)?;
    repo.delete_by_id(&id)
        .await
        .with_context(|| format!("Failed to delete user {}", id))?;
    output::success(&format!("User {} deleted", id));
    Ok(())
}
