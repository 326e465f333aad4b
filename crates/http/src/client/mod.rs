//! UnifyData HTTP client

pub mod auth;
pub mod error;
pub mod request;
pub mod session;

pub use auth::HttpRefreshTransport;
pub use request::{ApiRequest, Attempt};
pub use session::SessionClient;

use crate::types::error_message;
use error::ClientError;
use reqwest::{Client, ClientBuilder, header};
use std::time::Duration;
use unify_core::{Session, SessionConfig};

/// Client for the UnifyData API
///
/// Sends requests without credentials. Wrap it in a [`SessionClient`] for
/// endpoints that need a signed-in user.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a client from session configuration
    pub fn from_config(config: &SessionConfig) -> Result<Self, ClientError> {
        Self::builder()
            .base_url(config.base_url())
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a request builder for `path`
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Turn a request description into a builder, attaching `bearer` if given
    pub fn build_request(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self.request(request.method.clone(), &request.path);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        builder
    }

    /// Execute a request and handle common errors
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        decode(response).await
    }

    /// Bind this client to a session so requests carry its credentials
    pub fn with_session(self, session: Session) -> SessionClient {
        SessionClient::new(self, session)
    }

    /// Refresh transport that talks to this client's API
    pub fn refresh_transport(&self, refresh_path: &str) -> HttpRefreshTransport {
        HttpRefreshTransport::new(self.clone(), refresh_path)
    }
}

/// Map a response to `T`, or to a status-derived error
pub(crate) async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();

    if status.is_success() {
        Ok(response.json().await?)
    } else {
        let message = response
            .text()
            .await
            .map(|body| error_message(&body))
            .unwrap_or_else(|_| status.to_string());
        Err(ClientError::from_status(status, message))
    }
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ApiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout (ignored on wasm32, where the browser owns it)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Some(timeout) = self.timeout {
                client_builder = client_builder.timeout(timeout);
            }
            client_builder = client_builder.user_agent(
                self.user_agent
                    .unwrap_or_else(|| SessionConfig::default().user_agent),
            );
        }

        #[cfg(target_arch = "wasm32")]
        let _ = (self.timeout, self.user_agent);

        let client = client_builder.build()?;

        Ok(ApiClient { client, base_url })
    }
}
