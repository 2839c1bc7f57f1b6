//! Account editor: rename and password change for the signed-in user.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use leptos::prelude::*;

use crate::components::session_provider::SessionHandle;
use crate::net::types::{PasswordChange, ProfileUpdate};
use crate::state::auth::AuthState;

/// Raw profile form fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ProfileForm {
    pub username: String,
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Turn the form into an update. A password change needs the current
/// password, which the gateway re-verifies.
pub(crate) fn validate_profile_form(current_username: &str, form: &ProfileForm) -> Result<ProfileUpdate, &'static str> {
    let username = form.username.trim();
    if username.is_empty() {
        return Err("Username cannot be empty.");
    }

    let mut update = ProfileUpdate::default();
    if username != current_username {
        update.username = Some(username.to_owned());
    }
    if !form.new_password.is_empty() || !form.confirm_password.is_empty() {
        if form.new_password != form.confirm_password {
            return Err("Passwords do not match.");
        }
        if form.current_password.is_empty() {
            return Err("Enter your current password to change it.");
        }
        update.password =
            Some(PasswordChange { current: form.current_password.clone(), new: form.new_password.clone() });
    }

    if update.is_empty() {
        return Err("Nothing to change.");
    }
    Ok(update)
}

#[component]
pub fn ProfilePage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let session = expect_context::<SessionHandle>();

    let current_username = move || auth.with(|a| a.user.as_ref().map(|u| u.username.clone()).unwrap_or_default());
    let initial = auth.with_untracked(|a| a.user.as_ref().map(|u| u.username.clone()).unwrap_or_default());
    let form = RwSignal::new(ProfileForm { username: initial, ..ProfileForm::default() });
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    // Prefill once the resumed session arrives.
    Effect::new(move || {
        let name = current_username();
        form.update(|f| {
            if f.username.is_empty() {
                f.username = name;
            }
        });
    });

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let update = match validate_profile_form(&current_username(), &form.get()) {
            Ok(update) => update,
            Err(msg) => {
                info.set(msg.to_owned());
                return;
            }
        };
        busy.set(true);
        info.set("Saving...".to_owned());

        #[cfg(feature = "hydrate")]
        {
            let store = session.store();
            leptos::task::spawn_local(async move {
                match store.update_profile(&update).await {
                    Ok(()) => {
                        info.set("Profile updated.".to_owned());
                        form.update(|f| {
                            f.current_password.clear();
                            f.new_password.clear();
                            f.confirm_password.clear();
                        });
                    }
                    Err(crate::net::gateway::ProfileError::SessionExpired) => {
                        info.set("Your session has expired.".to_owned());
                        store.logout().await;
                    }
                    Err(e) => info.set(format!("Update failed: {e}")),
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, update);
        }
    };

    view! {
        <section class="profile-page">
            <h1 class="profile-page__title">"Profile"</h1>
            <form class="profile-form" on:submit=on_submit>
                <label class="form-label">
                    "Username"
                    <input
                        class="form-input"
                        type="text"
                        autocomplete="username"
                        prop:value=move || form.with(|f| f.username.clone())
                        on:input=move |ev| form.update(|f| f.username = event_target_value(&ev))
                    />
                </label>
                <label class="form-label">
                    "Current password"
                    <input
                        class="form-input"
                        type="password"
                        autocomplete="current-password"
                        prop:value=move || form.with(|f| f.current_password.clone())
                        on:input=move |ev| form.update(|f| f.current_password = event_target_value(&ev))
                    />
                </label>
                <label class="form-label">
                    "New password"
                    <input
                        class="form-input"
                        type="password"
                        autocomplete="new-password"
                        prop:value=move || form.with(|f| f.new_password.clone())
                        on:input=move |ev| form.update(|f| f.new_password = event_target_value(&ev))
                    />
                </label>
                <label class="form-label">
                    "Confirm new password"
                    <input
                        class="form-input"
                        type="password"
                        autocomplete="new-password"
                        prop:value=move || form.with(|f| f.confirm_password.clone())
                        on:input=move |ev| form.update(|f| f.confirm_password = event_target_value(&ev))
                    />
                </label>
                <button class="btn" type="submit" disabled=move || busy.get()>
                    "Save changes"
                </button>
            </form>
            <Show when=move || !info.get().is_empty()>
                <p class="profile-page__message">{move || info.get()}</p>
            </Show>
        </section>
    }
}
