//! UnifyData HTTP client
//!
//! [`client::ApiClient`] talks to the API without credentials.
//! [`client::SessionClient`] attaches the session's bearer token and turns
//! a 401 into one coordinated refresh followed by a replay.

pub mod client;
pub mod types;

pub use client::error::ClientError;
pub use client::{ApiClient, ApiRequest, HttpRefreshTransport, SessionClient};
pub use types::{AuthResponse, LoginRequest, RegisterRequest, User};

use std::rc::Rc;
use unify_core::{CredentialStore, Navigator, Session, SessionConfig};

/// Build a session client from configuration
///
/// The refresh transport shares the client's connection pool.
pub fn connect(
    config: &SessionConfig,
    store: Rc<dyn CredentialStore>,
    navigator: Rc<dyn Navigator>,
) -> Result<SessionClient, ClientError> {
    config
        .validate()
        .map_err(|e| ClientError::Configuration(e.to_string()))?;

    let client = ApiClient::from_config(config)?;
    let transport = Rc::new(client.refresh_transport(&config.refresh_path));
    let session = Session::new(config, store, transport, navigator);

    Ok(client.with_session(session))
}
