//! UnifyData client core: credential types, configuration and the session
//! refresh machinery shared by the HTTP client and the browser frontend

pub mod config;
pub mod error;
pub mod session;
pub mod timer;
pub mod types;

#[cfg(all(feature = "subscriber", not(target_arch = "wasm32")))]
pub mod tracing;

#[cfg(any(test, feature = "tests"))]
pub mod tests;

pub use config::SessionConfig;
pub use error::{AuthError, CoreError, CoreResult};
pub use session::{
    CredentialStore, MemoryCredentialStore, Navigator, RefreshCoordinator, RefreshState,
    RefreshTransport, Session, SessionGuard,
};
pub use types::{TokenPair, TokenResponse};
