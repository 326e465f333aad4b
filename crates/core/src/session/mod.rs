//! Credential lifecycle for one signed-in session

mod coordinator;
mod guard;
mod store;

pub use coordinator::{RefreshCoordinator, RefreshOutcome, RefreshState, RefreshTransport};
pub use guard::{Navigator, SessionGuard};
pub use store::{CredentialStore, MemoryCredentialStore};

use crate::config::SessionConfig;
use crate::types::TokenPair;
use std::rc::Rc;
use tracing::info;

/// Handle to the credential store, refresh coordinator and guard of one
/// session
///
/// Cloning is cheap and every clone refers to the same session.
#[derive(Clone)]
pub struct Session {
    store: Rc<dyn CredentialStore>,
    guard: Rc<SessionGuard>,
    coordinator: Rc<RefreshCoordinator>,
    refresh_on_unauthorized: bool,
}

impl Session {
    pub fn new(
        config: &SessionConfig,
        store: Rc<dyn CredentialStore>,
        transport: Rc<dyn RefreshTransport>,
        navigator: Rc<dyn Navigator>,
    ) -> Self {
        let guard = Rc::new(SessionGuard::new(
            store.clone(),
            navigator,
            config.login_route.clone(),
        ));
        let coordinator = Rc::new(RefreshCoordinator::new(
            store.clone(),
            transport,
            guard.clone(),
            config.refresh_timeout(),
        ));

        Self {
            store,
            guard,
            coordinator,
            refresh_on_unauthorized: config.refresh_on_unauthorized,
        }
    }

    /// Current credential pair, if signed in
    pub fn credentials(&self) -> Option<TokenPair> {
        self.store.read()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.read().is_some()
    }

    /// Store a pair from login or registration and start the session afresh
    pub fn establish(&self, pair: TokenPair) {
        info!("Session established");
        self.store.write(pair);
        self.coordinator.reset();
        self.guard.rearm();
    }

    /// Log out: release pending requests, clear credentials and redirect
    pub fn sign_out(&self) {
        self.coordinator.teardown();
        self.guard.sign_out();
    }

    /// Release pending requests without touching the stored credentials,
    /// e.g. when the page that owns the session goes away
    pub fn teardown(&self) {
        self.coordinator.teardown();
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    pub fn refresh_on_unauthorized(&self) -> bool {
        self.refresh_on_unauthorized
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.coordinator, &other.coordinator)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("refresh_state", &self.coordinator.state())
            .finish()
    }
}
