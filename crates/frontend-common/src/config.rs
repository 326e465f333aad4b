//! Frontend configuration

use unify_core::SessionConfig;

/// Session storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Session storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Path of the API relative to the page origin
pub const API_PREFIX: &str = "/api";

/// Defaults for the browser: the API is served from the page's own origin
pub fn browser_defaults() -> SessionConfig {
    SessionConfig {
        api_base_url: String::new(),
        ..SessionConfig::default()
    }
}

/// Fill in the API base URL from the page origin when none is configured
pub fn resolve(config: &SessionConfig) -> SessionConfig {
    let mut config = config.clone();
    if config.api_base_url.is_empty() {
        config.api_base_url = format!("{}{API_PREFIX}", page_origin());
    }
    config
}

fn page_origin() -> String {
    web_sys::window()
        .and_then(|window| window.location().origin().ok())
        .unwrap_or_default()
}
