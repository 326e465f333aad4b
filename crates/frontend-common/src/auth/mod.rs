//! Session context for Yew apps

pub mod context;

pub use context::{
    SessionContext, SessionProvider, use_is_authenticated, use_session_client, use_sign_out,
};
