//! Session client construction for the browser

use crate::config;
use crate::navigation::LocationNavigator;
use crate::storage::BrowserCredentialStore;
use std::rc::Rc;
use unify_core::SessionConfig;
pub use unify_http::ClientError;
use unify_http::SessionClient;

/// Build a session client over `sessionStorage` and `window.location`
pub fn create_session_client(config: &SessionConfig) -> Result<SessionClient, ClientError> {
    let config = config::resolve(config);
    unify_http::connect(
        &config,
        Rc::new(BrowserCredentialStore::new()),
        Rc::new(LocationNavigator::new()),
    )
}
