//! Request and response types for the Mastodon API
//!
//! Entities are decoded leniently: unknown fields are ignored and most fields
//! fall back to defaults. Fields the client cannot work without (a status'
//! content, an account's username, a notification's type) are required.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Accounts
// =============================================================================

/// A user account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, deserialize_with = "id_from_number_or_string")]
    pub id: i64,
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(default)]
    pub acct: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub following_count: i64,
    #[serde(default)]
    pub statuses_count: i64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub avatar_static: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub header_static: String,
}

// =============================================================================
// Statuses
// =============================================================================

/// A posted message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default, deserialize_with = "id_from_number_or_string")]
    pub id: i64,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub account: Option<Account>,
    #[serde(default, deserialize_with = "optional_id_from_number_or_string")]
    pub in_reply_to_id: Option<i64>,
    #[serde(default, deserialize_with = "optional_id_from_number_or_string")]
    pub in_reply_to_account_id: Option<i64>,
    #[serde(default)]
    pub reblog: Option<Box<Status>>,
    /// HTML content of the status
    #[serde(alias = "Content")]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reblogs_count: i64,
    #[serde(default)]
    pub favourites_count: i64,
    #[serde(default)]
    pub reblogged: Option<bool>,
    #[serde(default)]
    pub favourited: Option<bool>,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub spoiler_text: String,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub media_attachments: Vec<Attachment>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub application: Option<Application>,
}

/// Who may see a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
    Direct,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
            Self::Direct => "direct",
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "unlisted" => Ok(Self::Unlisted),
            "private" => Ok(Self::Private),
            "direct" => Ok(Self::Direct),
            other => Err(format!("unknown visibility: {}", other)),
        }
    }
}

/// A status to be posted
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Toot {
    pub status: String,
    pub in_reply_to_id: Option<i64>,
    pub media_ids: Vec<i64>,
    pub sensitive: bool,
    pub spoiler_text: Option<String>,
    pub visibility: Option<Visibility>,
}

impl Toot {
    /// Create a plain public toot
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Default::default()
        }
    }

    /// Encode as form parameters, omitting unset fields
    pub(crate) fn form_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("status", self.status.clone())];
        if let Some(id) = self.in_reply_to_id {
            params.push(("in_reply_to_id", id.to_string()));
        }
        for id in &self.media_ids {
            params.push(("media_ids[]", id.to_string()));
        }
        if self.sensitive {
            params.push(("sensitive", "true".to_string()));
        }
        if let Some(spoiler) = &self.spoiler_text {
            params.push(("spoiler_text", spoiler.clone()));
        }
        if let Some(visibility) = self.visibility {
            params.push(("visibility", visibility.as_str().to_string()));
        }
        params
    }
}

/// A mention of another account inside a status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub acct: String,
    #[serde(default, deserialize_with = "id_from_number_or_string")]
    pub id: i64,
}

/// A hashtag used in a status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// A media attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, deserialize_with = "id_from_number_or_string")]
    pub id: i64,
    #[serde(default, rename = "type")]
    pub attachment_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub preview_url: String,
    #[serde(default)]
    pub text_url: Option<String>,
}

// =============================================================================
// Notifications
// =============================================================================

/// A notification delivered to the authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, deserialize_with = "id_from_number_or_string")]
    pub id: i64,
    /// mention, reblog, favourite, follow, ...
    #[serde(rename = "type")]
    pub notification_type: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub account: Option<Account>,
    #[serde(default)]
    pub status: Option<Status>,
}

// =============================================================================
// Applications / OAuth
// =============================================================================

/// A registered OAuth application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(default, deserialize_with = "optional_id_from_number_or_string")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

/// Token response from `/oauth/token`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
}

/// Error body returned by the server
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    String(String),
}

impl NumberOrString {
    fn into_id<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::String(s) => s
                .parse()
                .map_err(|_| E::custom(format!("invalid id: {:?}", s))),
        }
    }
}

/// Older servers send numeric ids, newer ones send them as strings
fn id_from_number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    NumberOrString::deserialize(deserializer)?.into_id()
}

fn optional_id_from_number_or_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_id)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accepts_capitalized_content() {
        let status: Status = serde_json::from_str(r#"{"Content": "foo"}"#).unwrap();
        assert_eq!(status.content, "foo");
        assert_eq!(status.id, 0);
    }

    #[test]
    fn test_status_requires_content() {
        let result = serde_json::from_str::<Status>(r#"{"id": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_status_ids_as_strings() {
        let status: Status = serde_json::from_str(
            r#"{"id": "103270115826048975", "content": "<p>hi</p>", "in_reply_to_id": null,
                "account": {"id": "1", "username": "alice"}, "visibility": "unlisted",
                "created_at": "2019-12-08T03:48:33.901Z", "unknown_field": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(status.id, 103270115826048975);
        assert_eq!(status.in_reply_to_id, None);
        assert_eq!(status.account.unwrap().username, "alice");
        assert_eq!(status.visibility, Some(Visibility::Unlisted));
        assert!(status.created_at.is_some());
    }

    #[test]
    fn test_account_accepts_capitalized_username() {
        let account: Account = serde_json::from_str(r#"{"Username": "zzz"}"#).unwrap();
        assert_eq!(account.username, "zzz");
    }

    #[test]
    fn test_notification_requires_type() {
        assert!(serde_json::from_str::<Notification>(r#"{"id": 1}"#).is_err());

        let n: Notification =
            serde_json::from_str(r#"{"id": 7, "type": "follow", "account": {"username": "bob"}}"#)
                .unwrap();
        assert_eq!(n.notification_type, "follow");
        assert!(n.status.is_none());
    }

    #[test]
    fn test_toot_form_params() {
        let toot = Toot {
            status: "hello".into(),
            in_reply_to_id: Some(42),
            media_ids: vec![1, 2],
            sensitive: true,
            spoiler_text: None,
            visibility: Some(Visibility::Private),
        };
        let params = toot.form_params();
        assert_eq!(
            params,
            vec![
                ("status", "hello".to_string()),
                ("in_reply_to_id", "42".to_string()),
                ("media_ids[]", "1".to_string()),
                ("media_ids[]", "2".to_string()),
                ("sensitive", "true".to_string()),
                ("visibility", "private".to_string()),
            ]
        );
    }

    #[test]
    fn test_visibility_from_str() {
        assert_eq!("Direct".parse::<Visibility>(), Ok(Visibility::Direct));
        assert!("friends".parse::<Visibility>().is_err());
    }
}
