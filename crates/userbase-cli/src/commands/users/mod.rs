//! User subcommand implementations.

mod count;
mod create;
mod delete;
mod get;
mod list;
mod update;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::debug;

use userbase_core::{Datasource, UserId, UserRepository};
use userbase_file::{FileClient, FileCluster};

use crate::config::StoreArgs;

#[derive(Args, Debug)]
pub struct UsersCommand {
    #[command(subcommand)]
    pub command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum UsersSubcommand {
    /// Create a user
    Create(create::CreateArgs),

    /// List users, one page at a time
    List(list::ListArgs),

    /// Fetch a single user
    Get(get::GetArgs),

    /// Change fields of a user
    Update(update::UpdateArgs),

    /// Delete a user
    Delete(delete::DeleteArgs),

    /// Count all users
    Count(count::CountArgs),
}

pub async fn handle(cmd: UsersCommand, store: &StoreArgs) -> Result<()> {
    let config = store.resolve()?;
    let cluster = FileCluster::from_config(&config).context("Invalid store settings")?;
    let datasource = Datasource::init(&cluster)
        .await
        .context("Failed to connect to store")?;

    let repo = UserRepository::from_datasource(&datasource);
    repo.init_schema()
        .await
        .context("Failed to prepare users table")?;
    debug!(store = %config.url, keyspace = %config.keyspace, "Store ready");

    let result = run(cmd, &repo).await;

    datasource.stop().await.context("Failed to close store")?;
    result
}

async fn run(cmd: UsersCommand, repo: &UserRepository<FileClient>) -> Result<()> {
    match cmd.command {
        UsersSubcommand::Create(args) => create::run(args, repo).await,
        UsersSubcommand::List(args) => list::run(args, repo).await,
        UsersSubcommand::Get(args) => get::run(args, repo).await,
        UsersSubcommand::Update(args) => update::run(args, repo).await,
        UsersSubcommand::Delete(args) => delete::run(args, repo).await,
        UsersSubcommand::Count(args) => count::run(args, repo).await,
    }
}

fn parse_id(id: &str) -> Result<UserId> {
    UserId::parse(id).context("Invalid user id")
}
