//! Client credentials and application registration settings

use serde::{Deserialize, Serialize};

/// Redirect URI for applications that receive the authorization code out of band
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Scopes requested by the password grant
pub const DEFAULT_SCOPES: &str = "read write follow";

/// Settings for accessing the Mastodon API
///
/// `access_token` is only written by [`MastodonClient::authenticate`];
/// every other call reads it.
///
/// [`MastodonClient::authenticate`]: crate::MastodonClient::authenticate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Server base URL (e.g., "https://mastodon.social")
    pub server: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Config {
    /// Create a config for a server with registered application credentials
    pub fn new(
        server: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            access_token: None,
        }
    }

    /// Attach an existing access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.access_token = (!token.is_empty()).then_some(token);
        self
    }
}

/// Settings for registering a new application on a server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server base URL
    pub server: String,
    /// Name shown to users authorizing the application
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Where the authorization code is delivered
    #[serde(default = "default_redirect_uris")]
    pub redirect_uris: String,
    /// Space-separated scopes
    #[serde(default = "default_scopes")]
    pub scopes: String,
    /// Application homepage
    #[serde(default)]
    pub website: Option<String>,
}

impl AppConfig {
    pub fn new(server: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            client_name: client_name.into(),
            redirect_uris: default_redirect_uris(),
            scopes: default_scopes(),
            website: None,
        }
    }

    pub(crate) fn form_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("client_name", self.client_name.clone()),
            ("redirect_uris", self.redirect_uris.clone()),
            ("scopes", self.scopes.clone()),
        ];
        if let Some(website) = &self.website {
            params.push(("website", website.clone()));
        }
        params
    }
}

fn default_client_name() -> String {
    "mastodon-client".to_string()
}

fn default_redirect_uris() -> String {
    OOB_REDIRECT_URI.to_string()
}

fn default_scopes() -> String {
    DEFAULT_SCOPES.to_string()
}
