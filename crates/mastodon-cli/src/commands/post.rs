//! Post command - publish a status

use anyhow::{Context, Result};
use mastodon_client::{MastodonClient, Toot, Visibility};

use crate::output::{OutputContext, StatusRow};

/// Options for a new status
pub struct PostOptions<'a> {
    pub visibility: Option<&'a str>,
    pub spoiler: Option<&'a str>,
    pub sensitive: bool,
    pub reply_to: Option<i64>,
    pub media_ids: &'a [i64],
}

/// Post a status and print it
pub async fn post(
    client: &MastodonClient,
    text: &str,
    options: PostOptions<'_>,
    ctx: &OutputContext,
) -> Result<()> {
    let visibility = options
        .visibility
        .map(|v| v.parse::<Visibility>())
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let toot = Toot {
        status: text.to_string(),
        in_reply_to_id: options.reply_to,
        media_ids: options.media_ids.to_vec(),
        sensitive: options.sensitive,
        spoiler_text: options.spoiler.map(String::from),
        visibility,
    };

    let status = client
        .post_status(&toot)
        .await
        .context("Failed to post status")?;

    ctx.success(&format!("Posted status {}", status.id));
    ctx.print_one(&StatusRow::from(&status));
    Ok(())
}
