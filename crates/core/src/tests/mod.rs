//! Test doubles for the session layer
//!
//! Enabled for downstream crates through the `tests` feature.


pub use navigator::RecordingNavigator;
pub use store::CountingCredentialStore;
pub use transport::ScriptedRefreshTransport;
