//! Credential store backed by `window.sessionStorage`

use crate::config::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use tracing::warn;
use unify_core::{CredentialStore, TokenPair};
use web_sys::Storage;

/// Keeps the token pair in the tab's session storage so it survives reloads
/// but not the tab
///
/// A pair with one half missing reads as no pair at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserCredentialStore;

impl BrowserCredentialStore {
    pub fn new() -> Self {
        Self
    }
}

fn session_storage() -> Option<Storage> {
    web_sys::window().and_then(|w| w.session_storage().ok().flatten())
}

fn remove_pair(storage: &Storage) {
    for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
        if let Err(err) = storage.remove_item(key) {
            warn!(?err, key, "Failed to remove stored credential");
        }
    }
}

impl CredentialStore for BrowserCredentialStore {
    fn read(&self) -> Option<TokenPair> {
        let storage = session_storage()?;
        let access = storage.get_item(ACCESS_TOKEN_KEY).ok().flatten()?;
        let refresh = storage.get_item(REFRESH_TOKEN_KEY).ok().flatten()?;
        Some(TokenPair::new(access, refresh))
    }

    fn write(&self, pair: TokenPair) {
        let Some(storage) = session_storage() else {
            warn!("sessionStorage unavailable, credentials not persisted");
            return;
        };

        let written = storage
            .set_item(ACCESS_TOKEN_KEY, &pair.access_token)
            .and_then(|_| storage.set_item(REFRESH_TOKEN_KEY, &pair.refresh_token));
        if let Err(err) = written {
            warn!(?err, "Failed to persist credentials");
            remove_pair(&storage);
        }
    }

    fn clear(&self) {
        match session_storage() {
            Some(storage) => remove_pair(&storage),
            None => warn!("sessionStorage unavailable, credentials not cleared"),
        }
    }
}
