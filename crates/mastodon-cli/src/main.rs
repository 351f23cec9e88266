//! Mastodon CLI - Command-line tool for Mastodon servers
//!
//! Registers applications, logs in, posts, reads accounts and timelines, and
//! follows streaming timelines.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mastodon_client::{MastodonClient, StreamEndpoint};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::post::PostOptions;
use crate::config::{Config, ConfigArgs, MergedConfig};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "mastodon-cli")]
#[command(author, version, about = "Mastodon command-line client")]
#[command(propagate_version = true)]
struct Cli {
    /// Server URL
    #[arg(short, long, env = "MASTODON_SERVER")]
    server: Option<String>,

    /// OAuth client id
    #[arg(long, env = "MASTODON_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "MASTODON_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Access token
    #[arg(long, env = "MASTODON_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "MASTODON_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an application and obtain client credentials
    Register {
        /// Application name shown on posts
        #[arg(long, default_value = "mastodon-cli")]
        name: String,

        /// Application website
        #[arg(long)]
        website: Option<String>,

        /// Save the credentials to the config file
        #[arg(long)]
        save: bool,
    },

    /// Log in with username and password
    Login {
        /// Account email or username
        username: String,

        /// Account password
        #[arg(long, env = "MASTODON_PASSWORD", hide_env_values = true)]
        password: String,

        /// Save the access token to the config file
        #[arg(long)]
        save: bool,
    },

    /// Post a status
    Post {
        /// Status text
        text: String,

        /// Visibility: public, unlisted, private, direct
        #[arg(long)]
        visibility: Option<String>,

        /// Content warning shown before the text
        #[arg(long)]
        spoiler: Option<String>,

        /// Mark attached media as sensitive
        #[arg(long)]
        sensitive: bool,

        /// Id of the status being replied to
        #[arg(long)]
        reply_to: Option<i64>,

        /// Ids of previously uploaded media
        #[arg(long = "media", value_delimiter = ',')]
        media_ids: Vec<i64>,
    },

    /// Show account details
    Account {
        /// Account id
        id: i64,
    },

    /// List followers of an account
    Followers {
        /// Account id
        id: i64,
    },

    /// List accounts followed by an account
    Following {
        /// Account id
        id: i64,
    },

    /// Show the home timeline
    Timeline,

    /// Follow a streaming timeline in real time
    Stream {
        /// Timeline to follow
        #[arg(value_enum, default_value = "user")]
        timeline: StreamTimeline,

        /// Hashtag for the hashtag timeline
        #[arg(long, required_if_eq("timeline", "hashtag"))]
        tag: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StreamTimeline {
    /// Federated public timeline
    Public,
    /// Local public timeline
    Local,
    /// Home timeline and notifications
    User,
    /// Public statuses with a hashtag
    Hashtag,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    let config = if cli.config.is_some() {
        Config::load_from(&config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let args = ConfigArgs {
        server: cli.server.clone(),
        client_id: cli.client_id.clone(),
        client_secret: cli.client_secret.clone(),
        access_token: cli.access_token.clone(),
        no_color: cli.no_color,
    };
    let merged = config.merge_with_args(&args, cli.output.map(|o| o.as_str()));
    debug!("Using server {}", merged.server);

    // Create output context
    let format = cli
        .output
        .unwrap_or_else(|| OutputFormat::from_config(&merged.output));
    let ctx = OutputContext::new(format, merged.no_color, cli.quiet);

    // Execute command
    match &cli.command {
        Commands::Register {
            name,
            website,
            save,
        } => {
            let save_to = save.then_some((&config, config_path.as_path()));
            commands::register(&merged.server, name, website.as_deref(), save_to, &ctx).await?;
        }

        Commands::Login {
            username,
            password,
            save,
        } => {
            let mut client = create_client(&merged)?;
            let save_to = save.then_some((&config, config_path.as_path()));
            commands::login(&mut client, username, password, save_to, &ctx).await?;
        }

        Commands::Post {
            text,
            visibility,
            spoiler,
            sensitive,
            reply_to,
            media_ids,
        } => {
            let client = create_client(&merged)?;
            let options = PostOptions {
                visibility: visibility.as_deref(),
                spoiler: spoiler.as_deref(),
                sensitive: *sensitive,
                reply_to: *reply_to,
                media_ids,
            };
            commands::post(&client, text, options, &ctx).await?;
        }

        Commands::Account { id } => {
            let client = create_client(&merged)?;
            commands::account(&client, *id, &ctx).await?;
        }

        Commands::Followers { id } => {
            let client = create_client(&merged)?;
            commands::followers(&client, *id, &ctx).await?;
        }

        Commands::Following { id } => {
            let client = create_client(&merged)?;
            commands::following(&client, *id, &ctx).await?;
        }

        Commands::Timeline => {
            let client = create_client(&merged)?;
            commands::timeline(&client, &ctx).await?;
        }

        Commands::Stream { timeline, tag } => {
            let client = create_client(&merged)?;
            let endpoint = match timeline {
                StreamTimeline::Public => StreamEndpoint::Public,
                StreamTimeline::Local => StreamEndpoint::PublicLocal,
                StreamTimeline::User => StreamEndpoint::User,
                StreamTimeline::Hashtag => {
                    StreamEndpoint::Hashtag(tag.clone().context("--tag is required")?)
                }
            };
            commands::stream(&client, endpoint, &ctx).await?;
        }
    }

    Ok(())
}

/// Create a Mastodon client from the merged configuration
fn create_client(config: &MergedConfig) -> Result<MastodonClient> {
    MastodonClient::new(config.client_config()).context("Failed to create Mastodon client")
}
