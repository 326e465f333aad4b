//! Session layer configuration

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the authenticated request layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL every API path is appended to. Empty means "same origin"
    /// in the browser.
    pub api_base_url: String,

    /// Path of the token refresh endpoint, relative to `api_base_url`
    pub refresh_path: String,

    /// Route the browser is sent to when the session cannot be recovered
    pub login_route: String,

    /// Timeout for ordinary API requests in seconds (native only)
    pub request_timeout_secs: u64,

    /// Upper bound on a single refresh call in seconds
    pub refresh_timeout_secs: u64,

    /// Refresh and replay on 401 instead of surfacing `CredentialExpired`
    pub refresh_on_unauthorized: bool,

    /// User agent sent by native clients
    pub user_agent: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            login_route: "/auth/login".to_string(),
            request_timeout_secs: 30,
            refresh_timeout_secs: 10,
            refresh_on_unauthorized: true,
            user_agent: concat!("unify-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from a file, with `UNIFY_*` environment variables
    /// taking precedence
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result fails validation
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> CoreResult<Self> {
        let settings = Self::builder_with_defaults()?
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("UNIFY"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from defaults and `UNIFY_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed or the
    /// result fails validation
    pub fn from_env() -> CoreResult<Self> {
        let settings = Self::builder_with_defaults()?
            .add_source(config::Environment::with_prefix("UNIFY"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn builder_with_defaults()
    -> CoreResult<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Self::default();

        Ok(config::Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("refresh_path", defaults.refresh_path)?
            .set_default("login_route", defaults.login_route)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("refresh_timeout_secs", defaults.refresh_timeout_secs)?
            .set_default("refresh_on_unauthorized", defaults.refresh_on_unauthorized)?
            .set_default("user_agent", defaults.user_agent)?)
    }

    /// Check the values for internal consistency
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` naming the first offending field
    pub fn validate(&self) -> CoreResult<()> {
        if !self.api_base_url.is_empty() {
            url::Url::parse(&self.api_base_url).map_err(|e| {
                CoreError::invalid_config(format!("api_base_url is not a valid URL: {e}"))
            })?;
        }
        if !self.refresh_path.starts_with('/') {
            return Err(CoreError::invalid_config("refresh_path must start with '/'"));
        }
        if !self.login_route.starts_with('/') {
            return Err(CoreError::invalid_config("login_route must start with '/'"));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::invalid_config(
                "request_timeout_secs must be greater than zero",
            ));
        }
        if self.refresh_timeout_secs == 0 {
            return Err(CoreError::invalid_config(
                "refresh_timeout_secs must be greater than zero",
            ));
        }
        Ok(())
    }

    /// `api_base_url` with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}
