//! Wire types for the authentication endpoints

use serde::{Deserialize, Serialize};
use unify_core::TokenResponse;

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub company_name: String,
}

/// Body of `POST /auth/refresh`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// The signed-in user as returned by login and registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub role: UserRole,
    pub org_id: String,
    #[serde(default)]
    pub onboarding_completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
    Viewer,
}

/// The user's organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub plan: Option<String>,
}

/// Response of login and registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub organization: Organization,
    pub tokens: TokenResponse,
}

/// Error envelope returned by the API: `{"detail": {"error", "message"}}`
/// or `{"detail": "..."}`
#[derive(Debug, Clone, Deserialize)]
struct ErrorEnvelope {
    detail: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Structured { message: String },
    Plain(String),
}

/// Human-readable message from an error response body, falling back to the
/// raw body
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            detail: ErrorDetail::Structured { message },
        }) => message,
        Ok(ErrorEnvelope {
            detail: ErrorDetail::Plain(message),
        }) => message,
        Err(_) => body.to_string(),
    }
}
