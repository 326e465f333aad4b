//! Clear-and-redirect handling for sessions that cannot be recovered

use super::store::CredentialStore;
use std::cell::Cell;
use std::rc::Rc;
use tracing::{info, warn};

/// Performs the navigation to the login entry point
#[cfg_attr(test, mockall::automock)]
pub trait Navigator {
    fn redirect(&self, route: &str);
}

/// Ends a session once, however many requests failed with it
pub struct SessionGuard {
    store: Rc<dyn CredentialStore>,
    navigator: Rc<dyn Navigator>,
    login_route: String,
    tripped: Cell<bool>,
}

impl SessionGuard {
    pub fn new(
        store: Rc<dyn CredentialStore>,
        navigator: Rc<dyn Navigator>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            store,
            navigator,
            login_route: login_route.into(),
            tripped: Cell::new(false),
        }
    }

    /// Clear credentials and send the user to the login route
    ///
    /// Returns `false` without doing anything if the guard already fired for
    /// this session.
    pub fn on_unrecoverable(&self) -> bool {
        if self.tripped.replace(true) {
            return false;
        }

        warn!(route = %self.login_route, "Session could not be recovered, signing out");
        self.store.clear();
        self.navigator.redirect(&self.login_route);
        true
    }

    /// Explicit logout: always clears and redirects
    pub fn sign_out(&self) {
        info!(route = %self.login_route, "Signing out");
        self.tripped.set(true);
        self.store.clear();
        self.navigator.redirect(&self.login_route);
    }

    /// Allow the guard to fire again for a newly established session
    pub fn rearm(&self) {
        self.tripped.set(false);
    }

    pub fn has_fired(&self) -> bool {
        self.tripped.get()
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }
}
