//! Login page: username + password against the session store.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use crate::components::session_provider::SessionHandle;
use crate::routes::AppRoute;
use crate::state::auth::AuthState;
use crate::util::auth::{install_guard_redirect, login_route_decision};

/// Trim the identifier and require both fields.
pub(crate) fn validate_credentials(username: &str, password: &str) -> Result<(String, String), &'static str> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err("Enter both username and password.");
    }
    Ok((username.to_owned(), password.to_owned()))
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let session = expect_context::<SessionHandle>();
    install_guard_redirect(auth, login_route_decision, use_navigate());

    let username = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let (username_value, password_value) = match validate_credentials(&username.get(), &password.get()) {
            Ok(values) => values,
            Err(msg) => {
                info.set(msg.to_owned());
                return;
            }
        };
        busy.set(true);
        info.set("Signing in...".to_owned());

        #[cfg(feature = "hydrate")]
        {
            let store = session.store();
            leptos::task::spawn_local(async move {
                if let Err(e) = store.login(&username_value, &password_value).await {
                    info.set(format!("Sign-in failed: {e}"));
                    busy.set(false);
                }
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, username_value, password_value);
        }
    };

    view! {
        <div class="login-page">
            <div class="login-card">
                <h1>"NF Hub"</h1>
                <p class="login-card__subtitle">"Sign in to your account"</p>
                <form class="login-form" on:submit=on_submit>
                    <input
                        class="login-input"
                        type="text"
                        autocomplete="username"
                        placeholder="Username"
                        prop:value=move || username.get()
                        on:input=move |ev| username.set(event_target_value(&ev))
                    />
                    <input
                        class="login-input"
                        type="password"
                        autocomplete="current-password"
                        placeholder="Password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <button class="login-button" type="submit" disabled=move || busy.get()>
                        "Sign In"
                    </button>
                </form>
                <Show when=move || !info.get().is_empty()>
                    <p class="login-message">{move || info.get()}</p>
                </Show>
                <div class="login-divider"></div>
                <a class="login-link" href=AppRoute::Register.path()>
                    "Create an account"
                </a>
            </div>
        </div>
    }
}
