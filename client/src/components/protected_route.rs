//! Render-time guard for views that require a session.

use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use crate::state::auth::AuthState;
use crate::util::auth::{GuardDecision, install_guard_redirect, protected_route_decision};

/// Renders `children` only while a session is present; otherwise shows a
/// placeholder and redirects to `/login` once session resume has settled.
#[component]
pub fn ProtectedRoute(children: ChildrenFn) -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    install_guard_redirect(auth, protected_route_decision, use_navigate());

    view! {
        <Show
            when=move || auth.with(protected_route_decision) == GuardDecision::Render
            fallback=move || {
                view! {
                    <div class="guard-placeholder">
                        <p>{move || if auth.with(|a| a.loading) { "Loading..." } else { "Redirecting to login..." }}</p>
                    </div>
                }
            }
        >
            {children()}
        </Show>
    }
}
