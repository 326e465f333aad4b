//! Authentication endpoints and the network side of credential refresh

use super::{ApiClient, ClientError, decode};
use crate::types::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, error_message};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::debug;
use unify_core::{AuthError, RefreshTransport, TokenResponse};

impl ApiClient {
    /// Authenticate with email and password
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/login").json(request);
        self.execute(req).await
    }

    /// Create a user and organization
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let req = self.request(Method::POST, "/auth/register").json(request);
        self.execute(req).await
    }
}

/// `POST {base}/auth/refresh` over reqwest
#[derive(Clone)]
pub struct HttpRefreshTransport {
    client: ApiClient,
    path: String,
}

impl HttpRefreshTransport {
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }
}

#[async_trait(?Send)]
impl RefreshTransport for HttpRefreshTransport {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let request = self
            .client
            .request(Method::POST, &self.path)
            .json(&RefreshRequest {
                refresh_token: refresh_token.to_string(),
            });

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::RefreshTransportFailure(e.to_string()))?;
        let status = response.status();
        debug!(status = status.as_u16(), "Refresh endpoint answered");

        if status.is_success() {
            return decode::<TokenResponse>(response)
                .await
                .map_err(|e| AuthError::RefreshTransportFailure(e.to_string()));
        }

        let message = response
            .text()
            .await
            .map(|body| error_message(&body))
            .unwrap_or_else(|_| status.to_string());

        match status {
            StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::UNPROCESSABLE_ENTITY => Err(AuthError::RefreshRejected(message)),
            _ => Err(AuthError::RefreshTransportFailure(format!(
                "{}: {message}",
                status.as_u16()
            ))),
        }
    }
}
