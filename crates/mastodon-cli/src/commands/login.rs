//! Login command - obtain an access token with the password grant

use anyhow::{Context, Result};
use mastodon_client::MastodonClient;
use std::path::Path;

use crate::config::Config;
use crate::output::OutputContext;

/// Log in and optionally save the token
pub async fn login(
    client: &mut MastodonClient,
    username: &str,
    password: &str,
    save_to: Option<(&Config, &Path)>,
    ctx: &OutputContext,
) -> Result<()> {
    if client.config().client_id.is_empty() || client.config().client_secret.is_empty() {
        anyhow::bail!("No client credentials configured. Run `mastodon-cli register` first");
    }

    client
        .authenticate(username, password)
        .await
        .context("Failed to log in")?;

    let token = client
        .access_token()
        .context("Server did not issue an access token")?
        .to_string();

    match save_to {
        Some((config, path)) => {
            let config = Config {
                server: Some(client.config().server.clone()),
                client_id: Some(client.config().client_id.clone()),
                client_secret: Some(client.config().client_secret.clone()),
                access_token: Some(token),
                ..config.clone()
            };
            config.save_to(path)?;
            ctx.success(&format!("Logged in as {}; token saved to {}", username, path.display()));
        }
        None => {
            ctx.success(&format!("Logged in as {}", username));
            ctx.print_kv(&[("access_token", token)]);
        }
    }

    Ok(())
}
