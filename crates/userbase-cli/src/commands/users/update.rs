//! Update user command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;

use userbase_core::{Patch, UserPatch, UserRepository};
use userbase_file::FileClient;

use crate::output;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// User id
    pub id: String,

    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New email address
    #[arg(long)]
    pub email: Option<String>,

    /// New age
    #[arg(long, conflicts_with = "clear_age")]
    pub age: Option<i32>,

    /// Remove the stored age
    #[arg(long)]
    pub clear_age: bool,
}

impl UpdateArgs {
    fn patch(&self) -> UserPatch {
        let age = match (self.age, self.clear_age) {
            (Some(age), _) => Patch::Set(age),
            (None, true) => Patch::Clear,
            (None, false) => Patch::Keep,
        };
        UserPatch {
            name: self.name.clone(),
            email: self.email.clone(),
            age,
        }
    }
}

pub async fn run(args: UpdateArgs, repo: &UserRepository<FileClient>) -> Result<()> {
    let id = super::parse_id(&args.id)?;
    let patch = args.patch();
    if patch.is_empty() {
        bail!("Nothing to update; pass --name, --email, --age or --clear-age");
    }

    repo.update_by_id(&id, patch)
        .await
        .with_context(|| format!("Failed to update user {}", id))?;
    output::success(&format!("User {} updated", id));
    Ok(())
}
