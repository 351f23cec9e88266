//! Register command - create an OAuth application on the server

use anyhow::{Context, Result};
use mastodon_client::{AppConfig, MastodonClient};
use std::path::Path;

use crate::config::Config;
use crate::output::OutputContext;

/// Register an application and optionally save its credentials
pub async fn register(
    server: &str,
    name: &str,
    website: Option<&str>,
    save_to: Option<(&Config, &Path)>,
    ctx: &OutputContext,
) -> Result<()> {
    let mut app = AppConfig::new(server, name);
    app.website = website.map(String::from);

    ctx.info(&format!("Registering application '{}' at {}...", name, server));
    let registered = MastodonClient::register_app(&app)
        .await
        .context("Failed to register application")?;

    ctx.print_kv(&[
        ("client_id", registered.client_id.clone()),
        ("client_secret", registered.client_secret.clone()),
    ]);

    if let Some((config, path)) = save_to {
        let config = Config {
            server: Some(server.to_string()),
            client_id: Some(registered.client_id),
            client_secret: Some(registered.client_secret),
            access_token: None,
            ..config.clone()
        };
        config.save_to(path)?;
        ctx.success(&format!("Saved credentials to {}", path.display()));
    }

    Ok(())
}
