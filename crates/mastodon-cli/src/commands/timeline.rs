//! Timeline command

use anyhow::{Context, Result};
use mastodon_client::MastodonClient;

use crate::output::{OutputContext, StatusRow};

/// Print the home timeline
pub async fn timeline(client: &MastodonClient, ctx: &OutputContext) -> Result<()> {
    let statuses = client
        .get_timeline_home()
        .await
        .context("Failed to get home timeline")?;

    let rows: Vec<StatusRow> = statuses.iter().map(StatusRow::from).collect();
    ctx.print(&rows);
    Ok(())
}
