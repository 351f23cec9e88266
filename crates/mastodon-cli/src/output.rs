//! Output formatting for mastodon-cli (table, json, csv)

use clap::ValueEnum;
use colored::Colorize;
use mastodon_client::{Account, Notification, Status};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// Parse a format name from the config file, falling back to table
    pub fn from_config(name: &str) -> Self {
        <Self as ValueEnum>::from_str(name, true).unwrap_or_default()
    }
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print rows in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Csv => {
                for line in csv_lines(data) {
                    println!("{}", line);
                }
            }
        }
    }

    /// Print a single row in the configured format
    pub fn print_one<T: Tabled + Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Table => println!("{}", Table::new([data])),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Csv => {
                for line in csv_lines(&[data]) {
                    println!("{}", line);
                }
            }
        }
    }

    /// Print key-value pairs
    pub fn print_kv(&self, pairs: &[(&str, String)]) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&map).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Csv => {
                let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
                println!("{}", keys.join(","));
                let values: Vec<String> = pairs.iter().map(|(_, v)| escape_csv(v)).collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Render rows as CSV lines, header first
///
/// Columns are the field names of the first row, in map key order.
pub fn csv_lines<T: Serialize>(data: &[T]) -> Vec<String> {
    let Some(first) = data.first() else {
        return Vec::new();
    };

    let serde_json::Value::Object(map) = serde_json::to_value(first).unwrap_or_default() else {
        return Vec::new();
    };
    let headers: Vec<String> = map.keys().cloned().collect();

    let mut lines = vec![headers.join(",")];
    for item in data {
        if let Ok(serde_json::Value::Object(row)) = serde_json::to_value(item) {
            let values: Vec<String> = headers
                .iter()
                .map(|h| match row.get(h) {
                    Some(serde_json::Value::String(s)) => escape_csv(s),
                    Some(other) => escape_csv(&other.to_string()),
                    None => String::new(),
                })
                .collect();
            lines.push(values.join(","));
        }
    }
    lines
}

/// Escape a value for CSV output
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Reduce status HTML to plain text for terminal display
pub fn plain_text(html: &str) -> String {
    let html = html
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("</p><p>", "\n\n");

    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Status display for post and timeline commands
#[derive(Debug, Tabled, Serialize)]
pub struct StatusRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Account")]
    pub account: String,
    #[tabled(rename = "Created")]
    pub created_at: String,
    #[tabled(rename = "Visibility")]
    pub visibility: String,
    #[tabled(rename = "Content")]
    pub content: String,
}

impl From<&Status> for StatusRow {
    fn from(status: &Status) -> Self {
        // Show the boosted status, attributed to its author
        let shown = status.reblog.as_deref().unwrap_or(status);
        let account = shown
            .account
            .as_ref()
            .map(|a| format!("@{}", a.acct_or_username()))
            .unwrap_or_default();
        let account = match (&status.reblog, &status.account) {
            (Some(_), Some(booster)) => {
                format!("{} (boosted by @{})", account, booster.acct_or_username())
            }
            _ => account,
        };

        Self {
            id: status.id.to_string(),
            account,
            created_at: shown
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            visibility: shown
                .visibility
                .map(|v| v.as_str().to_string())
                .unwrap_or_default(),
            content: plain_text(&shown.content),
        }
    }
}

/// Account display for account, followers and following commands
#[derive(Debug, Tabled, Serialize)]
pub struct AccountRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Username")]
    pub username: String,
    #[tabled(rename = "Account")]
    pub acct: String,
    #[tabled(rename = "Name")]
    pub display_name: String,
    #[tabled(rename = "Followers")]
    pub followers: i64,
    #[tabled(rename = "Following")]
    pub following: i64,
    #[tabled(rename = "Statuses")]
    pub statuses: i64,
}

impl From<&Account> for AccountRow {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.clone(),
            acct: account.acct.clone(),
            display_name: account.display_name.clone(),
            followers: account.followers_count,
            following: account.following_count,
            statuses: account.statuses_count,
        }
    }
}

/// Stream event display for the stream command
#[derive(Debug, Tabled, Serialize)]
pub struct StreamRow {
    #[tabled(rename = "Event")]
    pub event: String,
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Account")]
    pub account: String,
    #[tabled(rename = "Content")]
    pub content: String,
}

impl StreamRow {
    pub fn update(status: &Status) -> Self {
        let row = StatusRow::from(status);
        Self {
            event: "update".to_string(),
            id: row.id,
            account: row.account,
            content: row.content,
        }
    }

    pub fn notification(notification: &Notification) -> Self {
        Self {
            event: "notification".to_string(),
            id: notification.id.to_string(),
            account: notification
                .account
                .as_ref()
                .map(|a| format!("@{}", a.acct_or_username()))
                .unwrap_or_default(),
            content: match &notification.status {
                Some(status) => format!(
                    "{}: {}",
                    notification.notification_type,
                    plain_text(&status.content)
                ),
                None => notification.notification_type.clone(),
            },
        }
    }

    pub fn delete(id: i64) -> Self {
        Self {
            event: "delete".to_string(),
            id: id.to_string(),
            account: String::new(),
            content: String::new(),
        }
    }
}

trait AccountName {
    fn acct_or_username(&self) -> &str;
}

impl AccountName for Account {
    fn acct_or_username(&self) -> &str {
        if self.acct.is_empty() {
            &self.username
        } else {
            &self.acct
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn account(username: &str, acct: &str) -> Account {
        Account {
            username: username.to_string(),
            acct: acct.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            plain_text("<p>Hello <a href=\"x\">@bob</a></p><p>R&amp;D<br>today</p>"),
            "Hello @bob\n\nR&D\ntoday"
        );
        assert_eq!(plain_text("plain"), "plain");
    }

    #[test]
    fn test_status_row_for_boost() {
        let original = Status {
            id: 1,
            account: Some(account("alice", "alice@example.social")),
            content: "<p>original</p>".into(),
            ..Default::default()
        };
        let boost = Status {
            id: 2,
            account: Some(account("bob", "")),
            reblog: Some(Box::new(original)),
            ..Default::default()
        };

        let row = StatusRow::from(&boost);

        assert_eq!(row.id, "2");
        assert_eq!(row.account, "@alice@example.social (boosted by @bob)");
        assert_eq!(row.content, "original");
    }

    #[test]
    fn test_csv_lines_escape_values() {
        let rows = vec![StreamRow {
            event: "update".into(),
            id: "1".into(),
            account: "@bob".into(),
            content: "hello, \"world\"".into(),
        }];

        assert_eq!(
            csv_lines(&rows),
            vec![
                "account,content,event,id".to_string(),
                "@bob,\"hello, \"\"world\"\"\",update,1".to_string(),
            ]
        );
    }

    #[test]
    fn test_output_format_from_config() {
        assert_eq!(OutputFormat::from_config("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_config("csv"), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_config("yaml"), OutputFormat::Table);
    }
}
