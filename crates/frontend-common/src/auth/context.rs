//! Session context and provider

use crate::client::create_session_client;
use crate::config;
use tracing::error;
use unify_core::SessionConfig;
use unify_http::SessionClient;
use yew::prelude::*;

/// Session shared with every component below a [`SessionProvider`]
pub type SessionContext = SessionClient;

/// Session provider props
#[derive(Properties, PartialEq)]
pub struct SessionProviderProps {
    /// An empty `api_base_url` resolves against the page origin
    #[prop_or_else(config::browser_defaults)]
    pub config: SessionConfig,
    pub children: Children,
}

/// Owns one session for the mounted app
///
/// Pending requests are released when the provider unmounts. Stored
/// credentials are kept so a remount picks the session up again.
#[function_component(SessionProvider)]
pub fn session_provider(props: &SessionProviderProps) -> Html {
    let client = use_memo(props.config.clone(), |config| {
        create_session_client(config)
            .map_err(|err| error!(%err, "Failed to build session client"))
            .ok()
    });

    {
        let client = client.clone();
        use_effect_with(client, |client| {
            let client = (**client).clone();
            move || {
                if let Some(client) = client {
                    client.session().teardown();
                }
            }
        });
    }

    match (*client).clone() {
        Some(client) => html! {
            <ContextProvider<SessionContext> context={client}>
                {props.children.clone()}
            </ContextProvider<SessionContext>>
        },
        None => html! { {props.children.clone()} },
    }
}

/// Hook to use the session client, if a provider built one
#[hook]
pub fn use_session_client() -> Option<SessionClient> {
    use_context::<SessionContext>()
}

/// Hook to check if a credential is stored
///
/// Reflects the store at render time.
#[hook]
pub fn use_is_authenticated() -> bool {
    use_session_client()
        .map(|client| client.is_authenticated())
        .unwrap_or(false)
}

/// Hook returning a callback that signs the user out
#[hook]
pub fn use_sign_out() -> Callback<()> {
    let client = use_session_client();
    Callback::from(move |_| {
        if let Some(client) = &client {
            client.sign_out();
        }
    })
}
