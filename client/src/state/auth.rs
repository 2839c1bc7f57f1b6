//! Auth-session state for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionStore` is the only writer of the session. Route guards, the
//! inactivity monitor and user-aware components read it through
//! [`AuthState`] snapshots, either by subscribing directly or through the
//! `RwSignal<AuthState>` mirror provided as Leptos context.
//!
//! CONCURRENCY
//! ===========
//! Everything runs on the browser's single thread. Gateway awaits are the
//! only suspension points, so every state write below is atomic relative to
//! activity signals and route changes. A generation counter lets a slow
//! session resume detect that a login or logout overtook it.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::net::gateway::{AuthError, PersistenceGateway, ProfileError};
use crate::net::types::{ProfileUpdate, Session};
use crate::routes::{AppRoute, Navigator};

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<Session>,
    /// True only while the startup session resume is pending.
    pub loading: bool,
}

impl AuthState {
    /// State before session resume has finished.
    #[must_use]
    pub fn resuming() -> Self {
        Self { user: None, loading: true }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

type Listener = Rc<dyn Fn(&AuthState)>;

struct Inner {
    state: RefCell<AuthState>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_listener: Cell<u64>,
    /// Bumped whenever login, register or logout decides the session.
    generation: Cell<u64>,
    /// A stored session may exist but has not been confirmed yet.
    resume_pending: Cell<bool>,
    auth_in_flight: Cell<bool>,
    gateway: Rc<dyn PersistenceGateway>,
    navigator: Rc<dyn Navigator>,
}

/// Process-wide owner of the current session. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Rc<Inner>,
}

/// Keeps a [`SessionStore::subscribe`] callback registered until dropped.
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    store: Weak<Inner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

/// Marks an explicit login/register as running; cleared on every exit path.
struct AuthOpGuard {
    inner: Rc<Inner>,
}

impl Drop for AuthOpGuard {
    fn drop(&mut self) {
        self.inner.auth_in_flight.set(false);
    }
}

impl SessionStore {
    /// New store in the [`AuthState::resuming`] state. Call
    /// [`initialize`](Self::initialize) once to settle it.
    pub fn new(gateway: Rc<dyn PersistenceGateway>, navigator: Rc<dyn Navigator>) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(AuthState::resuming()),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                generation: Cell::new(0),
                resume_pending: Cell::new(false),
                auth_in_flight: Cell::new(false),
                gateway,
                navigator,
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<Session> {
        self.inner.state.borrow().user.clone()
    }

    /// Whether a login or registration is awaiting the gateway.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.inner.auth_in_flight.get()
    }

    /// Register a callback invoked with the new state after every change.
    pub fn subscribe(&self, listener: impl Fn(&AuthState) + 'static) -> Subscription {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(listener)));
        Subscription { store: Rc::downgrade(&self.inner), id }
    }

    /// Resume a persisted session. Never navigates and never fails: a resume
    /// error is logged and leaves the user logged out.
    pub async fn initialize(&self) {
        let started_at = self.inner.generation.get();
        self.inner.resume_pending.set(true);
        self.update(|s| s.loading = true);

        let outcome = self.inner.gateway.resume_session().await;
        self.inner.resume_pending.set(false);
        let resumed = match outcome {
            Ok(user) => user,
            Err(e) => {
                log::warn!("session resume failed, continuing logged out: {e}");
                None
            }
        };

        let overtaken = self.inner.generation.get() != started_at;
        if overtaken {
            log::debug!("session resume result discarded; session changed while pending");
        }
        self.update(|s| {
            if !overtaken {
                s.user = resumed;
            }
            s.loading = false;
        });
    }

    /// Authenticate and land on the dashboard.
    ///
    /// # Errors
    ///
    /// Returns the gateway's [`AuthError`], or [`AuthError::InFlight`] if
    /// another login/registration has not resolved yet. The session is left
    /// unchanged on error.
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<(), AuthError> {
        let _op = self.begin_auth_op()?;
        let session = self.inner.gateway.authenticate(identifier, secret).await.inspect_err(|e| {
            log::info!("login rejected for {identifier}: {e}");
        })?;
        self.establish(session);
        Ok(())
    }

    /// Create an account, then behave like a successful login.
    ///
    /// # Errors
    ///
    /// Same contract as [`login`](Self::login).
    pub async fn register(&self, identifier: &str, secret: &str) -> Result<(), AuthError> {
        let _op = self.begin_auth_op()?;
        let session = self.inner.gateway.create_account(identifier, secret).await.inspect_err(|e| {
            log::info!("registration rejected for {identifier}: {e}");
        })?;
        self.establish(session);
        Ok(())
    }

    /// Clear the session and go to the login page.
    ///
    /// The local session is dropped before the remote call, so it is gone even
    /// if invalidation fails. Idempotent: without a session no remote call is
    /// made, but the navigation still happens. While a resume is pending the
    /// stored session is unconfirmed but may be live, so it is revoked too.
    pub async fn logout(&self) {
        let previous = self.take_session();
        let unconfirmed = self.inner.resume_pending.get();
        if previous.is_none() && !unconfirmed {
            self.inner.navigator.navigate_to(AppRoute::Login);
            return;
        }

        let who = previous.as_ref().map_or("unconfirmed session", |s| s.username.as_str());
        if let Err(e) = self.inner.gateway.invalidate_session().await {
            log::warn!("remote logout failed for {who}: {e}");
        }
        log::info!("logged out {who}");
        self.inner.navigator.navigate_to(AppRoute::Login);
    }

    /// Edit the signed-in user's own record and refresh the session.
    ///
    /// # Errors
    ///
    /// [`ProfileError::NotSignedIn`] without a session; otherwise the
    /// gateway's error. The session is left unchanged on error.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ProfileError> {
        let Some(current) = self.current_user() else {
            return Err(ProfileError::NotSignedIn);
        };
        let updated = self.inner.gateway.update_profile(&current, update).await.inspect_err(|e| {
            log::info!("profile update rejected for {}: {e}", current.username);
        })?;

        // Only refresh if the same session is still signed in.
        let still_current = self.current_user().is_some_and(|u| u.token == current.token);
        if still_current {
            log::info!("profile updated for {}", updated.username);
            self.update(|s| s.user = Some(updated));
        }
        Ok(())
    }

    fn begin_auth_op(&self) -> Result<AuthOpGuard, AuthError> {
        if self.inner.auth_in_flight.replace(true) {
            return Err(AuthError::InFlight);
        }
        Ok(AuthOpGuard { inner: Rc::clone(&self.inner) })
    }

    fn establish(&self, session: Session) {
        log::info!("session established for {}", session.username);
        self.bump_generation();
        self.update(|s| s.user = Some(session));
        self.inner.navigator.navigate_to(AppRoute::LANDING);
    }

    fn take_session(&self) -> Option<Session> {
        self.bump_generation();
        let previous = self.inner.state.borrow_mut().user.take();
        if previous.is_some() {
            self.notify();
        }
        previous
    }

    fn bump_generation(&self) {
        self.inner.generation.set(self.inner.generation.get() + 1);
    }

    fn update(&self, f: impl FnOnce(&mut AuthState)) {
        let changed = {
            let mut state = self.inner.state.borrow_mut();
            let before = state.clone();
            f(&mut state);
            *state != before
        };
        if changed {
            self.notify();
        }
    }

    /// Listeners may subscribe, unsubscribe or read the store re-entrantly,
    /// so nothing stays borrowed while they run.
    fn notify(&self) {
        let state = self.snapshot();
        let listeners: Vec<Listener> = self.inner.listeners.borrow().iter().map(|(_, l)| Rc::clone(l)).collect();
        for listener in listeners {
            listener(&state);
        }
    }
}
