//! Authenticated request dispatch with coordinated refresh and replay

use super::{ApiClient, ApiRequest, Attempt, ClientError, decode};
use crate::types::{AuthResponse, LoginRequest, RegisterRequest};
use reqwest::StatusCode;
use tracing::debug;
use unify_core::{AuthError, Session};

/// Sends requests on behalf of the signed-in user
///
/// Business code only ever sees a response or a [`ClientError`]; refresh and
/// replay happen underneath.
#[derive(Clone)]
pub struct SessionClient {
    client: ApiClient,
    session: Session,
}

impl SessionClient {
    pub fn new(client: ApiClient, session: Session) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Client for endpoints that take no credentials
    pub fn public(&self) -> &ApiClient {
        &self.client
    }

    /// Send `request` with the current credential
    ///
    /// A 401 triggers at most one coordinated refresh and one replay. Any
    /// other status is returned untouched.
    pub async fn send(&self, request: &ApiRequest) -> Result<reqwest::Response, ClientError> {
        let mut attempt = Attempt::Initial;
        let mut bearer = self.session.credentials().map(|pair| pair.access_token);

        loop {
            let response = self
                .client
                .build_request(request, bearer.as_deref())
                .send()
                .await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            debug!(
                method = %request.method,
                path = %request.path,
                ?attempt,
                "Request unauthorized"
            );

            match (attempt, bearer) {
                (Attempt::Replay, _) => return Err(AuthError::ReplayFailure.into()),
                (Attempt::Initial, None) => return Err(AuthError::Unauthenticated.into()),
                (Attempt::Initial, Some(sent)) => {
                    bearer = Some(self.fresh_access_token(&sent).await?);
                    attempt = Attempt::Replay;
                }
            }
        }
    }

    /// Send `request` and decode a successful JSON body
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        decode(response).await
    }

    /// Log in and establish the session from the returned tokens
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let response = self.client.login(request).await?;
        self.establish(&response);
        Ok(response)
    }

    /// Register and establish the session from the returned tokens
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let response = self.client.register(request).await?;
        self.establish(&response);
        Ok(response)
    }

    /// Clear credentials and go to the login route
    pub fn sign_out(&self) {
        self.session.sign_out();
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    fn establish(&self, response: &AuthResponse) {
        // An omitted refresh token leaves an empty one, which the first
        // refresh reports as rejected.
        let previous = self
            .session
            .credentials()
            .map(|pair| pair.refresh_token)
            .unwrap_or_default();
        let pair = response.tokens.clone().into_pair(&previous);
        self.session.establish(pair);
    }

    /// Access token to replay with after `sent` was refused
    async fn fresh_access_token(&self, sent: &str) -> Result<String, AuthError> {
        if !self.session.refresh_on_unauthorized() {
            return Err(AuthError::CredentialExpired);
        }

        // A refresh that finished while this request was in flight already
        // replaced the token; replay with it instead of refreshing again.
        if let Some(current) = self.session.credentials() {
            if current.access_token != sent {
                debug!("Credential already refreshed, replaying");
                return Ok(current.access_token);
            }
        }

        self.session.coordinator().refresh().await
    }
}

impl PartialEq for SessionClient {
    fn eq(&self, other: &Self) -> bool {
        self.session == other.session
    }
}
