//! Page chrome: main menu on console routes, bare content on auth pages.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use leptos::prelude::*;
use leptos_router::hooks::use_location;

use crate::components::session_provider::SessionHandle;
use crate::routes::AppRoute;
use crate::state::auth::AuthState;

/// The menu belongs to console routes, and only once a session is confirmed.
/// It stays hidden while a resume is pending.
pub(crate) fn menu_visible(path: &str, state: &AuthState) -> bool {
    AppRoute::path_is_protected(path) && state.is_authenticated()
}

#[component]
pub fn Layout(children: Children) -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let pathname = use_location().pathname;
    let show_menu = move || pathname.with(|path| auth.with(|state| menu_visible(path, state)));

    view! {
        <div class="console">
            <Show when=show_menu>
                <MainMenu/>
            </Show>
            <main class="console__main">{children()}</main>
        </div>
    }
}

/// Top navigation with the current user and a logout button.
#[component]
pub fn MainMenu() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let session = expect_context::<SessionHandle>();
    let pathname = use_location().pathname;
    let logging_out = RwSignal::new(false);

    let link_class = move |route: AppRoute| {
        let active = pathname.with(|path| AppRoute::from_path(path) == Some(route));
        if active { "main-menu__link main-menu__link--active" } else { "main-menu__link" }
    };
    let username = move || auth.with(|a| a.user.as_ref().map(|u| u.username.clone()).unwrap_or_default());

    let on_logout = move |_| {
        if logging_out.get_untracked() {
            return;
        }
        logging_out.set(true);
        #[cfg(feature = "hydrate")]
        {
            let store = session.store();
            leptos::task::spawn_local(async move {
                store.logout().await;
                logging_out.set(false);
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = session;
        }
    };

    view! {
        <nav class="main-menu">
            <span class="main-menu__brand">"NF HUB"</span>
            <a href=AppRoute::Dashboard.path() class=move || link_class(AppRoute::Dashboard)>
                "Dashboard"
            </a>
            <a href=AppRoute::Companies.path() class=move || link_class(AppRoute::Companies)>
                "Companies"
            </a>
            <a href=AppRoute::Xmls.path() class=move || link_class(AppRoute::Xmls)>
                "XMLs"
            </a>
            <span class="main-menu__spacer"></span>
            <a href=AppRoute::Profile.path() class=move || link_class(AppRoute::Profile)>
                {username}
            </a>
            <button class="btn main-menu__logout" on:click=on_logout disabled=move || logging_out.get()>
                "Logout"
            </button>
        </nav>
    }
}
