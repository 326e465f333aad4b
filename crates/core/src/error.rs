//! Common error types shared across crates

/// Standard result type for core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Core error types that can be shared across crates
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl CoreError {
    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Authentication failures surfaced by the session layer
///
/// Only `RefreshRejected` and `RefreshTransportFailure` end the session; the
/// rest are resolved for the single request that produced them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No credential was attached and the endpoint required one
    #[error("Not authenticated")]
    Unauthenticated,

    /// The attached credential was refused and automatic refresh is disabled
    #[error("Credential expired")]
    CredentialExpired,

    /// The refresh endpoint refused the refresh token
    #[error("Refresh rejected: {0}")]
    RefreshRejected(String),

    /// The refresh call failed on the network or timed out
    #[error("Refresh failed: {0}")]
    RefreshTransportFailure(String),

    /// The replayed request was refused again after a successful refresh
    #[error("Request refused after credential refresh")]
    ReplayFailure,

    /// The session was torn down while the request waited on a refresh
    #[error("Session closed while waiting for credential refresh")]
    Cancelled,
}

impl AuthError {
    /// Whether this failure ends the session
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            Self::RefreshRejected(_) | Self::RefreshTransportFailure(_)
        )
    }
}
