//! Account commands - look up accounts and their relationships

use anyhow::{Context, Result};
use mastodon_client::MastodonClient;

use crate::output::{AccountRow, OutputContext};

/// Show a single account
pub async fn account(client: &MastodonClient, id: i64, ctx: &OutputContext) -> Result<()> {
    let account = client
        .get_account(id)
        .await
        .with_context(|| format!("Failed to get account {}", id))?;

    ctx.print_one(&AccountRow::from(&account));
    Ok(())
}

/// List the accounts following an account
pub async fn followers(client: &MastodonClient, id: i64, ctx: &OutputContext) -> Result<()> {
    let accounts = client
        .get_account_followers(id)
        .await
        .with_context(|| format!("Failed to get followers of account {}", id))?;

    let rows: Vec<AccountRow> = accounts.iter().map(AccountRow::from).collect();
    ctx.print(&rows);
    Ok(())
}

/// List the accounts an account follows
pub async fn following(client: &MastodonClient, id: i64, ctx: &OutputContext) -> Result<()> {
    let accounts = client
        .get_account_following(id)
        .await
        .with_context(|| format!("Failed to get accounts followed by {}", id))?;

    let rows: Vec<AccountRow> = accounts.iter().map(AccountRow::from).collect();
    ctx.print(&rows);
    Ok(())
}
