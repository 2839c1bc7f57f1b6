//! Route guard decisions and the Leptos helpers that apply them.
//!
//! SYSTEM CONTEXT
//! ==============
//! Protected views and the login view must agree on redirect behavior, so
//! both read the same pure decisions below. Redirects wait for the startup
//! session resume to settle; otherwise a reload would bounce through
//! `/login` before the stored session is found.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;

use crate::routes::AppRoute;
use crate::state::auth::AuthState;

/// Outcome of evaluating a route against the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the view's children unchanged.
    Render,
    /// Session resume still pending; render neither the view nor a redirect.
    Wait,
    /// Replace the view with a navigation to this route.
    Redirect(AppRoute),
}

/// Decision for any protected view.
#[must_use]
pub fn protected_route_decision(state: &AuthState) -> GuardDecision {
    if state.user.is_some() {
        GuardDecision::Render
    } else if state.loading {
        GuardDecision::Wait
    } else {
        GuardDecision::Redirect(AppRoute::Login)
    }
}

/// Decision for the login view: an existing session skips straight to the
/// landing view, but only once loading has finished.
#[must_use]
pub fn login_route_decision(state: &AuthState) -> GuardDecision {
    if !state.loading && state.user.is_some() {
        GuardDecision::Redirect(AppRoute::LANDING)
    } else {
        GuardDecision::Render
    }
}

/// Navigate whenever `decide` asks for a redirect.
pub fn install_guard_redirect<F>(auth: RwSignal<AuthState>, decide: fn(&AuthState) -> GuardDecision, navigate: F)
where
    F: Fn(&str, NavigateOptions) + Clone + 'static,
{
    Effect::new(move || {
        if let GuardDecision::Redirect(target) = auth.with(decide) {
            navigate(target.path(), NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });
}
