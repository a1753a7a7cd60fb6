//! Count users command implementation.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use userbase_core::UserRepository;
use userbase_file::FileClient;

use crate::output;

#[derive(Args, Debug)]
pub struct CountArgs {}

pub async fn run(_args: CountArgs, repo: &UserRepository<FileClient>) -> Result<()> {
    let count = repo.count().await.context("Failed to count users")?;
    output::json(&json!({ "count": count }))
}
