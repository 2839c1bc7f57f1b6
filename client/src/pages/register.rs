//! Account registration page.

#[cfg(test)]
#[path = "register_test.rs"]
mod register_test;

use leptos::prelude::*;

use crate::components::session_provider::SessionHandle;
use crate::pages::login::validate_credentials;
use crate::routes::AppRoute;

/// Login rules plus a matching confirmation.
pub(crate) fn validate_registration(
    username: &str,
    password: &str,
    confirm: &str,
) -> Result<(String, String), &'static str> {
    let values = validate_credentials(username, password)?;
    if password != confirm {
        return Err("Passwords do not match.");
    }
    Ok(values)
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    let session = expect_context::<SessionHandle>();

    let username = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let confirm = RwSignal::new(String::new());
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let (username_value, password_value) =
            match validate_registration(&username.get(), &password.get(), &confirm.get()) {
                Ok(values) => values,
                Err(msg) => {
                    info.set(msg.to_owned());
                    return;
                }
            };
        busy.set(true);
        info.set("Creating account...".to_owned());

        #[cfg(feature = "hydrate")]
        {
            let store = session.store();
            leptos::task::spawn_local(async move {
                if let Err(e) = store.register(&username_value, &password_value).await {
                    info.set(format!("Registration failed: {e}"));
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
                <p class="login-card__subtitle">"Create an account"</p>
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
                        autocomplete="new-password"
                        placeholder="Password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <input
                        class="login-input"
                        type="password"
                        autocomplete="new-password"
                        placeholder="Confirm password"
                        prop:value=move || confirm.get()
                        on:input=move |ev| confirm.set(event_target_value(&ev))
                    />
                    <button class="login-button" type="submit" disabled=move || busy.get()>
                        "Register"
                    </button>
                </form>
                <Show when=move || !info.get().is_empty()>
                    <p class="login-message">{move || info.get()}</p>
                </Show>
                <div class="login-divider"></div>
                <a class="login-link" href=AppRoute::Login.path()>
                    "Already have an account? Sign in"
                </a>
            </div>
        </div>
    }
}
