//! Browser integration for the UnifyData session client
//!
//! Credentials live in `sessionStorage`, redirects go through
//! `window.location`, and a [`SessionProvider`] owns the session for the
//! mounted app.

pub mod auth;
pub mod client;
pub mod config;
pub mod navigation;
pub mod storage;

pub use auth::{SessionProvider, use_is_authenticated, use_session_client, use_sign_out};
pub use client::{ClientError, create_session_client};
pub use navigation::LocationNavigator;
pub use storage::BrowserCredentialStore;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Route `tracing` output to the browser console
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init_logging() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(tracing_web::MakeWebConsoleWriter::new());

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
