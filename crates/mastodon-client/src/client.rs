//! Mastodon HTTP client implementation

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use crate::config::{AppConfig, Config, DEFAULT_SCOPES};
use crate::error::{ClientError, Result};
use crate::streaming::{CancelToken, EventStream, StreamEndpoint};
use crate::types::*;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Mastodon REST API client
///
/// Holds the credential used for every call. Clones share connection pools
/// but own their credential; authenticating one clone does not update others.
#[derive(Debug, Clone)]
pub struct MastodonClient {
    client: Client,
    /// Same settings without an overall timeout, for unbounded stream bodies
    streaming_client: Client,
    base_url: Url,
    config: Config,
}

impl MastodonClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `config` - Server URL and application credentials
    pub fn new(config: Config) -> Result<Self> {
        Self::with_timeouts(config, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new client with custom timeouts
    ///
    /// `timeout` bounds plain request/response calls. Streaming calls only use
    /// `connect_timeout`, since their bodies never finish on their own.
    pub fn with_timeouts(config: Config, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        let streaming_client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        let base_url = Url::parse(&config.server)?;

        Ok(Self {
            client,
            streaming_client,
            base_url,
            config,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the credential in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current bearer token, if authenticated
    pub fn access_token(&self) -> Option<&str> {
        self.config.access_token.as_deref()
    }

    // =========================================================================
    // Applications / OAuth
    // =========================================================================

    /// Register a new application and obtain its client credentials
    #[instrument]
    pub async fn register_app(app: &AppConfig) -> Result<Application> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;
        let url = join_path(&Url::parse(&app.server)?, "/api/v1/apps");
        debug!("Registering application at {}", url);

        let response = client.post(url).form(&app.form_params()).send().await?;
        handle_response(response).await
    }

    /// Obtain an access token with the password grant
    ///
    /// On success the token is stored and used by every later call. On any
    /// failure the previous token is kept.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        let url = self.endpoint("/oauth/token");
        let params = [
            ("client_id", self.config.client_id.clone()),
            ("client_secret", self.config.client_secret.clone()),
            ("grant_type", "password".to_string()),
            ("username", username.to_string()),
            ("password", password.to_string()),
            ("scope", DEFAULT_SCOPES.to_string()),
        ];

        let response = self.client.post(url).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = error_message(response, status).await;
            return Err(ClientError::AuthError(format!("bad authorization: {}", message)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))?;
        if token.access_token.is_empty() {
            return Err(ClientError::AuthError(
                "server did not issue an access token".to_string(),
            ));
        }

        debug!("Authenticated as {}", username);
        self.config.access_token = Some(token.access_token);
        Ok(())
    }

    // =========================================================================
    // Statuses
    // =========================================================================

    /// Post a new status
    #[instrument(skip(self, toot))]
    pub async fn post_status(&self, toot: &Toot) -> Result<Status> {
        self.do_api(Method::POST, "/api/v1/statuses", &toot.form_params())
            .await
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Get an account by id
    #[instrument(skip(self))]
    pub async fn get_account(&self, id: i64) -> Result<Account> {
        self.do_api(Method::GET, &format!("/api/v1/accounts/{}", id), &[])
            .await
    }

    /// Get the accounts following an account
    #[instrument(skip(self))]
    pub async fn get_account_followers(&self, id: i64) -> Result<Vec<Account>> {
        self.do_api(Method::GET, &format!("/api/v1/accounts/{}/followers", id), &[])
            .await
    }

    /// Get the accounts an account follows
    #[instrument(skip(self))]
    pub async fn get_account_following(&self, id: i64) -> Result<Vec<Account>> {
        self.do_api(Method::GET, &format!("/api/v1/accounts/{}/following", id), &[])
            .await
    }

    // =========================================================================
    // Timelines
    // =========================================================================

    /// Get the home timeline of the authenticated user
    #[instrument(skip(self))]
    pub async fn get_timeline_home(&self) -> Result<Vec<Status>> {
        self.do_api(Method::GET, "/api/v1/timelines/home", &[]).await
    }

    // =========================================================================
    // Streaming
    // =========================================================================

    /// Open a streaming timeline
    ///
    /// Returns once the server has accepted the request and started the
    /// response; events are then read on a background task. Connection
    /// failures and non-success statuses are returned here and start no task.
    /// If `cancel` fires while connecting, the returned stream is already
    /// closed.
    ///
    /// # Example
    /// ```ignore
    /// let cancel = CancelToken::new();
    /// let mut events = client.open_stream(StreamEndpoint::User, &cancel).await?;
    ///
    /// while let Some(event) = events.recv().await {
    ///     if let Event::Notification(n) = event {
    ///         println!("{}", n.notification_type);
    ///     }
    /// }
    /// ```
    #[instrument(skip(self, cancel))]
    pub async fn open_stream(
        &self,
        endpoint: StreamEndpoint,
        cancel: &CancelToken,
    ) -> Result<EventStream> {
        let url = self.endpoint(endpoint.path());
        debug!("Connecting to stream: {}", url);

        let request = self
            .request(&self.streaming_client, Method::GET, url, &endpoint.query())
            .header(ACCEPT, "text/event-stream");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Stream cancelled while connecting");
                return Ok(EventStream::cancelled(cancel.clone()));
            }
            response = request.send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(extract_error(response, status).await);
        }

        debug!("Stream connected, status {}", status);
        Ok(EventStream::spawn(response.bytes_stream(), cancel.clone()))
    }

    /// Stream the federated public timeline
    pub async fn stream_public(&self, cancel: &CancelToken) -> Result<EventStream> {
        self.open_stream(StreamEndpoint::Public, cancel).await
    }

    /// Stream the public timeline of this server only
    pub async fn stream_public_local(&self, cancel: &CancelToken) -> Result<EventStream> {
        self.open_stream(StreamEndpoint::PublicLocal, cancel).await
    }

    /// Stream the home timeline and notifications of the authenticated user
    pub async fn stream_user(&self, cancel: &CancelToken) -> Result<EventStream> {
        self.open_stream(StreamEndpoint::User, cancel).await
    }

    /// Stream public statuses with a hashtag
    pub async fn stream_hashtag(&self, tag: &str, cancel: &CancelToken) -> Result<EventStream> {
        self.open_stream(StreamEndpoint::Hashtag(tag.to_string()), cancel)
            .await
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    /// Issue one authorized request and return the live response
    ///
    /// Non-success statuses are turned into errors; the body is left unread.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Response> {
        let url = self.endpoint(path);
        let response = self.request(&self.client, method, url, params).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(extract_error(response, status).await)
        }
    }

    /// Send a request and deserialize the JSON response
    async fn do_api<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let response = self.send(method, path, params).await?;
        handle_response(response).await
    }

    fn request(
        &self,
        http: &Client,
        method: Method,
        url: Url,
        params: &[(&str, String)],
    ) -> RequestBuilder {
        let mut request = if method == Method::GET {
            let request = http.get(url);
            if params.is_empty() {
                request
            } else {
                request.query(params)
            }
        } else {
            http.request(method, url).form(params)
        };

        if let Some(token) = self.access_token() {
            request = request.bearer_auth(token);
        }
        request
    }

    fn endpoint(&self, path: &str) -> Url {
        join_path(&self.base_url, path)
    }
}

/// Append an API path to the server URL, keeping any path prefix it has
fn join_path(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url
}

/// Handle response and deserialize JSON
async fn handle_response<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    } else {
        Err(extract_error(response, status).await)
    }
}

async fn extract_error(response: Response, status: StatusCode) -> ClientError {
    let message = error_message(response, status).await;
    ClientError::server_error(status.as_u16(), message)
}

async fn error_message(response: Response, status: StatusCode) -> String {
    // Try to parse error response body
    match response.json::<ErrorResponse>().await {
        Ok(err) => match err.error_description {
            Some(description) => format!("{}: {}", err.error, description),
            None => err.error,
        },
        Err(_) => format!("HTTP {}", status),
    }
}
