//! Owns the session store and inactivity monitor for the app's lifetime.
//!
//! SYSTEM CONTEXT
//! ==============
//! Mounted once inside the router. It mirrors every store change into the
//! `RwSignal<AuthState>` context so views stay reactive, starts the startup
//! session resume, and keeps the inactivity monitor in step with the current
//! route and session.

use std::rc::Rc;

use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use crate::net::gateway::RecordGateway;
use crate::net::parse::ParseGateway;
use crate::state::auth::{AuthState, SessionStore, Subscription};
use crate::util::browser::RouterNavigator;

/// Context handle for components that need to call the store.
#[derive(Clone, Copy)]
pub struct SessionHandle {
    store: StoredValue<SessionStore, LocalStorage>,
    records: StoredValue<Rc<dyn RecordGateway>, LocalStorage>,
    _mirror: StoredValue<Subscription, LocalStorage>,
}

impl SessionHandle {
    #[must_use]
    pub fn store(&self) -> SessionStore {
        self.store.get_value()
    }

    /// Record access for the console screens. Shares the store's token.
    #[must_use]
    pub fn records(&self) -> Rc<dyn RecordGateway> {
        self.records.get_value()
    }
}

#[component]
pub fn SessionProvider(children: Children) -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let navigator = RouterNavigator::new(use_navigate());
    let gateway = Rc::new(ParseGateway::from_build_env());
    let records: Rc<dyn RecordGateway> = gateway.clone();
    let store = SessionStore::new(gateway, Rc::new(navigator));

    auth.set(store.snapshot());
    let mirror = store.subscribe(move |state| auth.set(state.clone()));
    provide_context(SessionHandle {
        store: StoredValue::new_local(store.clone()),
        records: StoredValue::new_local(records),
        _mirror: StoredValue::new_local(mirror),
    });

    #[cfg(feature = "hydrate")]
    {
        let resuming = store.clone();
        leptos::task::spawn_local(async move { resuming.initialize().await });
        install_inactivity_monitor(auth, store);
    }

    children()
}

/// Arm the monitor on protected routes with a session; disarm otherwise.
#[cfg(feature = "hydrate")]
fn install_inactivity_monitor(auth: RwSignal<AuthState>, store: SessionStore) {
    use leptos_router::hooks::use_location;

    use crate::routes::AppRoute;
    use crate::state::idle::InactivityMonitor;
    use crate::util::browser::{DocumentActivity, TimeoutScheduler};

    let location = use_location();
    let monitor = InactivityMonitor::new(TimeoutScheduler, DocumentActivity, move || {
        let store = store.clone();
        leptos::task::spawn_local(async move { store.logout().await });
    });
    let monitor = StoredValue::new_local(monitor);

    Effect::new(move || {
        let protected = location.pathname.with(|path| AppRoute::path_is_protected(path));
        let authenticated = auth.with(AuthState::is_authenticated);
        monitor.with_value(|m| m.sync(protected, authenticated));
    });

    on_cleanup(move || {
        let _ = monitor.try_with_value(InactivityMonitor::teardown);
    });
}
