//! Create user command implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use userbase_core::{NewUser, UserRepository};
use userbase_file::FileClient;

use crate::output;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Email address
    #[arg(long)]
    pub email: String,

    /// Age in years
    #[arg(long)]
    pub age: Option<i32>,

    /// Creation time (RFC 3339); defaults to now
    #[arg(long)]
    pub created_at: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: CreateArgs, repo: &UserRepository<FileClient>) -> Result<()> {
    let created_at = args
        .created_at
        .as_deref()
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("Invalid --created-at '{}'", s))
        })
        .transpose()?;

    let new_user = NewUser {
        name: args.name,
        email: args.email,
        age: args.age,
        created_at,
    };

    let user = repo
        .create(new_user)
        .await
        .context("Failed to create user")?;

    output::value(&user, args.pretty)
}
