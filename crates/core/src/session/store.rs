//! Credential storage

use crate::types::TokenPair;
use std::cell::RefCell;

/// Holder of the current credential pair
///
/// Implementations must treat the pair as one value: `read` returns either
/// the last written pair or nothing, never one token from each of two writes.
pub trait CredentialStore {
    /// The last written pair, or `None` if nothing is stored
    fn read(&self) -> Option<TokenPair>;

    /// Replace the stored pair
    fn write(&self, pair: TokenPair);

    /// Remove the stored pair. Clearing an empty store is a no-op.
    fn clear(&self);
}

/// In-process credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    pair: RefCell<Option<TokenPair>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `pair`
    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            pair: RefCell::new(Some(pair)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn read(&self) -> Option<TokenPair> {
        self.pair.borrow().clone()
    }

    fn write(&self, pair: TokenPair) {
        *self.pair.borrow_mut() = Some(pair);
    }

    fn clear(&self) {
        self.pair.borrow_mut().take();
    }
}
