//! List users command implementation.

use anyhow::{Context, Result};
use clap::Args;
use futures_util::StreamExt;
use serde_json::{Map, Value};

use userbase_core::{Filter, PageToken, UserRepository};
use userbase_file::FileClient;

use crate::output;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Conditions as JSON, e.g. '{"name": "A", "age": {"gte": 18}}'
    #[arg(long = "where", conflicts_with = "filter")]
    pub where_clause: Option<String>,

    /// Full filter as JSON, e.g. '{"where": {"name": "A"}, "limit": 10}'
    #[arg(long)]
    pub filter: Option<String>,

    /// Maximum number of users per page
    #[arg(long)]
    pub limit: Option<u64>,

    /// Token from a previous page's nextPageState
    #[arg(long, conflicts_with = "all")]
    pub page_state: Option<String>,

    /// Follow page tokens and print every matching user, one per line
    #[arg(long)]
    pub all: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl ListArgs {
    fn filter(&self) -> Result<Option<Filter>> {
        let mut filter = match (&self.filter, &self.where_clause) {
            (Some(json), _) => {
                Some(serde_json::from_str::<Filter>(json).context("Invalid --filter JSON")?)
            }
            (None, Some(json)) => {
                let where_clause: Map<String, Value> =
                    serde_json::from_str(json).context("Invalid --where JSON")?;
                Some(Filter {
                    where_clause: Some(where_clause),
                    limit: None,
                })
            }
            (None, None) => None,
        };

        if let Some(limit) = self.limit {
            filter = Some(filter.unwrap_or_default().with_limit(limit));
        }
        Ok(filter)
    }
}

pub async fn run(args: ListArgs, repo: &UserRepository<FileClient>) -> Result<()> {
    let filter = args.filter()?;

    if args.all {
        let mut stream = Box::pin(repo.stream(filter));
        while let Some(user) = stream.next().await {
            let user = user.context("Failed to list users")?;
            output::value(&user, args.pretty)?;
        }
        return Ok(());
    }

    let token = args.page_state.clone().map(PageToken::from);
    let page = repo
        .list(filter.as_ref(), token.as_ref())
        .await
        .context("Failed to list users")?;

    output::value(&page, args.pretty)
}
