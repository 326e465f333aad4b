//! Navigation through `window.location`

use tracing::{debug, warn};
use unify_core::Navigator;

/// Routes under this prefix are the sign-in pages themselves
const AUTH_PREFIX: &str = "/auth";

/// Full-page navigation to the login route
///
/// Does nothing while the user is already on an authentication page, so a
/// failed background request on the login form does not reload it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocationNavigator;

impl LocationNavigator {
    pub fn new() -> Self {
        Self
    }
}

impl Navigator for LocationNavigator {
    fn redirect(&self, route: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let location = window.location();

        if location
            .pathname()
            .map(|path| path.starts_with(AUTH_PREFIX))
            .unwrap_or(false)
        {
            debug!("Already on an authentication page, not redirecting");
            return;
        }

        if let Err(err) = location.set_href(route) {
            warn!(?err, route, "Redirect failed");
        }
    }
}
