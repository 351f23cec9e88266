//! Stream command - follow a streaming timeline in real time

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use mastodon_client::{CancelToken, Event, MastodonClient, StreamClosure, StreamEndpoint};
use tracing::debug;

use crate::output::{csv_lines, OutputContext, OutputFormat, StreamRow};

/// Print events from a streaming timeline until Ctrl+C or the server ends it
pub async fn stream(
    client: &MastodonClient,
    endpoint: StreamEndpoint,
    ctx: &OutputContext,
) -> Result<()> {
    let cancel = CancelToken::new();

    // Set up Ctrl+C handler
    let token = cancel.clone();
    ctrlc::set_handler(move || token.cancel()).context("Failed to install Ctrl+C handler")?;

    ctx.info(&format!("Connecting to {}...", endpoint.path()));
    let mut events = client
        .open_stream(endpoint, &cancel)
        .await
        .context("Failed to open stream")?;
    ctx.info("Press Ctrl+C to stop");

    let mut header_printed = false;
    while let Some(event) = events.next().await {
        let row = match &event {
            Event::Update(status) => StreamRow::update(status),
            Event::Notification(notification) => StreamRow::notification(notification),
            Event::Delete(id) => StreamRow::delete(*id),
            Event::Error(e) if e.is_terminal() => {
                ctx.error(&format!("Stream error: {}", e));
                continue;
            }
            Event::Error(e) => {
                ctx.warn(&format!("Skipping event: {}", e));
                continue;
            }
        };
        print_stream_row(&row, &mut header_printed, ctx);
    }

    let closure = events.close().await;
    debug!(?closure, "Stream finished");
    match closure {
        StreamClosure::Clean => ctx.info("Stream ended"),
        StreamClosure::Cancelled => ctx.success("Stream cancelled"),
        StreamClosure::Error => bail!("Stream closed after a read error"),
    }

    Ok(())
}

/// Print one stream event in the configured format
fn print_stream_row(row: &StreamRow, header_printed: &mut bool, ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Table => {
            // Simple inline display for streaming
            let prefix = format!("[{}] #{}", row.event, row.id);
            if row.account.is_empty() {
                println!("{}", prefix);
            } else {
                println!("{} {}: {}", prefix, row.account, row.content);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(row) {
                println!("{}", json);
            }
        }
        OutputFormat::Csv => {
            let lines = csv_lines(std::slice::from_ref(row));
            let skip = if *header_printed { 1 } else { 0 };
            for line in lines.iter().skip(skip) {
                println!("{}", line);
            }
            *header_printed = true;
        }
    }
}
