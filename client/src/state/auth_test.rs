use std::cell::RefCell;

use futures::executor::block_on;
use futures::future::join;

use super::*;
use crate::net::gateway::ResumeError;
use crate::net::types::PasswordChange;
use crate::testing::{FakeGateway, RecordingNavigator, session};

fn store_with(gateway: &Rc<FakeGateway>) -> (SessionStore, Rc<RecordingNavigator>) {
    let navigator = RecordingNavigator::new();
    let store = SessionStore::new(gateway.clone(), navigator.clone());
    (store, navigator)
}

// =============================================================
// AuthState
// =============================================================

#[test]
fn auth_state_default_no_user() {
    let state = AuthState::default();
    assert!(state.user.is_none());
    assert!(!state.loading);
}

#[test]
fn new_store_is_resuming() {
    let (store, _) = store_with(&FakeGateway::new());
    assert_eq!(store.snapshot(), AuthState::resuming());
}

// =============================================================
// initialize
// =============================================================

#[test]
fn initialize_resumes_persisted_session() {
    let gateway = FakeGateway::new();
    *gateway.resume_result.borrow_mut() = Ok(Some(session("alice")));
    let (store, navigator) = store_with(&gateway);

    block_on(store.initialize());

    let state = store.snapshot();
    assert_eq!(state.user, Some(session("alice")));
    assert!(!state.loading);
    assert_eq!(navigator.count(), 0);
}

#[test]
fn initialize_without_stored_session_is_logged_out() {
    let (store, _) = store_with(&FakeGateway::new());
    block_on(store.initialize());
    assert_eq!(store.snapshot(), AuthState { user: None, loading: false });
}

#[test]
fn initialize_absorbs_resume_errors() {
    let gateway = FakeGateway::new();
    *gateway.resume_result.borrow_mut() = Err(ResumeError::Rejected("expired".to_owned()));
    let (store, navigator) = store_with(&gateway);

    block_on(store.initialize());

    assert_eq!(store.snapshot(), AuthState { user: None, loading: false });
    assert_eq!(navigator.count(), 0);
}

#[test]
fn resume_result_is_discarded_when_login_finishes_first() {
    let gateway = FakeGateway::with_account("bob", "pw");
    *gateway.resume_result.borrow_mut() = Ok(None);
    let (store, _) = store_with(&gateway);
    let release = gateway.hold_next_call();

    block_on(join(store.initialize(), async {
        store.login("bob", "pw").await.unwrap();
        let _ = release.send(());
    }));

    let state = store.snapshot();
    assert_eq!(state.user.map(|u| u.username), Some("bob".to_owned()));
    assert!(!state.loading);
}

// =============================================================
// login / register
// =============================================================

#[test]
fn login_sets_session_and_lands_on_dashboard() {
    let gateway = FakeGateway::with_account("alice", "secret");
    let (store, navigator) = store_with(&gateway);

    block_on(store.login("alice", "secret")).unwrap();

    assert_eq!(store.current_user(), Some(session("alice")));
    assert_eq!(navigator.last(), Some(AppRoute::Dashboard));
}

#[test]
fn login_failure_propagates_and_leaves_session_unset() {
    let gateway = FakeGateway::with_account("alice", "secret");
    let (store, navigator) = store_with(&gateway);

    let err = block_on(store.login("alice", "wrong")).unwrap_err();

    assert_eq!(err, AuthError::InvalidCredentials);
    assert!(store.current_user().is_none());
    assert_eq!(navigator.count(), 0);
    assert!(!store.is_busy());
}

#[test]
fn login_network_failure_propagates() {
    let gateway = FakeGateway::with_account("alice", "secret");
    gateway.network_down.set(true);
    let (store, _) = store_with(&gateway);

    let err = block_on(store.login("alice", "secret")).unwrap_err();
    assert!(matches!(err, AuthError::Network(_)));
}

#[test]
fn concurrent_login_is_rejected_while_first_is_pending() {
    let gateway = FakeGateway::with_account("alice", "secret");
    let (store, _) = store_with(&gateway);
    let release = gateway.hold_next_call();

    let (first, second) = block_on(join(store.login("alice", "secret"), async {
        let second = store.login("alice", "secret").await;
        let _ = release.send(());
        second
    }));

    assert_eq!(first, Ok(()));
    assert_eq!(second, Err(AuthError::InFlight));
    assert_eq!(gateway.auth_calls.get(), 1);
    assert!(!store.is_busy());
}

#[test]
fn register_creates_account_then_logs_in() {
    let gateway = FakeGateway::new();
    let (store, navigator) = store_with(&gateway);

    block_on(store.register("carol", "pw")).unwrap();

    assert_eq!(store.current_user(), Some(session("carol")));
    assert_eq!(navigator.last(), Some(AppRoute::Dashboard));
    assert!(gateway.accounts.borrow().contains_key("carol"));
}

#[test]
fn register_duplicate_propagates() {
    let gateway = FakeGateway::with_account("carol", "pw");
    let (store, navigator) = store_with(&gateway);

    let err = block_on(store.register("carol", "other")).unwrap_err();

    assert_eq!(err, AuthError::DuplicateIdentifier);
    assert!(store.current_user().is_none());
    assert_eq!(navigator.count(), 0);
}

// =============================================================
// logout
// =============================================================

#[test]
fn logout_clears_session_and_goes_to_login() {
    let gateway = FakeGateway::with_account("alice", "secret");
    let (store, navigator) = store_with(&gateway);
    block_on(store.login("alice", "secret")).unwrap();

    block_on(store.logout());

    assert!(store.current_user().is_none());
    assert_eq!(navigator.last(), Some(AppRoute::Login));
    assert_eq!(gateway.invalidate_calls.get(), 1);
}

#[test]
fn logout_clears_locally_when_remote_invalidation_fails() {
    let gateway = FakeGateway::with_account("alice", "secret");
    gateway.fail_invalidate.set(true);
    let (store, navigator) = store_with(&gateway);
    block_on(store.login("alice", "secret")).unwrap();

    block_on(store.logout());

    assert!(store.current_user().is_none());
    assert_eq!(navigator.last(), Some(AppRoute::Login));
}

#[test]
fn logout_twice_is_idempotent() {
    let gateway = FakeGateway::with_account("alice", "secret");
    let (store, navigator) = store_with(&gateway);
    block_on(store.login("alice", "secret")).unwrap();

    block_on(store.logout());
    block_on(store.logout());

    assert!(store.current_user().is_none());
    assert_eq!(gateway.invalidate_calls.get(), 1);
    assert_eq!(&navigator.visits.borrow()[1..], &[AppRoute::Login, AppRoute::Login]);
}

#[test]
fn logout_without_session_still_navigates() {
    let gateway = FakeGateway::new();
    let (store, navigator) = store_with(&gateway);

    block_on(store.logout());

    assert!(store.current_user().is_none());
    assert_eq!(navigator.last(), Some(AppRoute::Login));
    assert_eq!(gateway.invalidate_calls.get(), 0);
}

#[test]
fn logout_during_resume_revokes_stored_session() {
    let gateway = FakeGateway::new();
    *gateway.resume_result.borrow_mut() = Ok(Some(session("alice")));
    let (store, navigator) = store_with(&gateway);
    let release = gateway.hold_next_call();

    block_on(join(store.initialize(), async {
        store.logout().await;
        let _ = release.send(());
    }));

    assert_eq!(gateway.invalidate_calls.get(), 1);
    assert_eq!(store.snapshot(), AuthState { user: None, loading: false });
    assert_eq!(navigator.last(), Some(AppRoute::Login));
}

#[test]
fn logout_after_resume_settles_makes_no_extra_remote_call() {
    let gateway = FakeGateway::new();
    let (store, _) = store_with(&gateway);
    block_on(store.initialize());

    block_on(store.logout());

    assert_eq!(gateway.invalidate_calls.get(), 0);
}

// =============================================================
// update_profile
// =============================================================

fn signed_in(username: &str, password: &str) -> (Rc<FakeGateway>, SessionStore) {
    let gateway = FakeGateway::with_account(username, password);
    let (store, _) = store_with(&gateway);
    block_on(store.login(username, password)).unwrap();
    (gateway, store)
}

#[test]
fn update_profile_renames_user() {
    let (gateway, store) = signed_in("alice", "secret");
    let update = ProfileUpdate { username: Some("alicia".to_owned()), password: None };

    block_on(store.update_profile(&update)).unwrap();

    let user = store.current_user().unwrap();
    assert_eq!(user.username, "alicia");
    assert_eq!(user.token, "r:alice");
    assert!(gateway.accounts.borrow().contains_key("alicia"));
}

#[test]
fn update_profile_changes_password_after_verifying_current() {
    let (gateway, store) = signed_in("alice", "secret");
    let update = ProfileUpdate {
        username: None,
        password: Some(PasswordChange { current: "secret".to_owned(), new: "better".to_owned() }),
    };

    block_on(store.update_profile(&update)).unwrap();

    assert_eq!(gateway.accounts.borrow().get("alice").map(String::as_str), Some("better"));
}

#[test]
fn update_profile_wrong_current_password_leaves_session() {
    let (gateway, store) = signed_in("alice", "secret");
    let update = ProfileUpdate {
        username: Some("alicia".to_owned()),
        password: Some(PasswordChange { current: "guess".to_owned(), new: "better".to_owned() }),
    };

    let err = block_on(store.update_profile(&update)).unwrap_err();

    assert_eq!(err, ProfileError::WrongCurrentPassword);
    assert_eq!(store.current_user(), Some(session("alice")));
    assert_eq!(gateway.accounts.borrow().get("alice").map(String::as_str), Some("secret"));
}

#[test]
fn update_profile_duplicate_username_propagates() {
    let (gateway, store) = signed_in("alice", "secret");
    gateway.accounts.borrow_mut().insert("bob".to_owned(), "pw".to_owned());
    let update = ProfileUpdate { username: Some("bob".to_owned()), password: None };

    assert_eq!(block_on(store.update_profile(&update)), Err(ProfileError::DuplicateIdentifier));
}

#[test]
fn update_profile_requires_session() {
    let (store, _) = store_with(&FakeGateway::new());
    let update = ProfileUpdate { username: Some("x".to_owned()), password: None };
    assert_eq!(block_on(store.update_profile(&update)), Err(ProfileError::NotSignedIn));
}

#[test]
fn update_profile_result_is_dropped_after_logout() {
    let (gateway, store) = signed_in("alice", "secret");
    let release = gateway.hold_next_call();
    let update = ProfileUpdate { username: Some("alicia".to_owned()), password: None };

    let (result, ()) = block_on(join(store.update_profile(&update), async {
        store.logout().await;
        let _ = release.send(());
    }));

    assert!(result.is_ok());
    assert!(store.current_user().is_none());
}

// =============================================================
// subscribe
// =============================================================

#[test]
fn subscribers_see_every_change() {
    let gateway = FakeGateway::with_account("alice", "secret");
    let (store, _) = store_with(&gateway);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = store.subscribe(move |state| sink.borrow_mut().push(state.clone()));

    block_on(store.initialize());
    block_on(store.login("alice", "secret")).unwrap();
    block_on(store.logout());

    let seen = seen.borrow();
    assert_eq!(seen.len(), 3);
    assert!(!seen[0].loading && seen[0].user.is_none());
    assert!(seen[1].is_authenticated());
    assert!(!seen[2].is_authenticated());
}

#[test]
fn dropped_subscription_stops_notifications() {
    let gateway = FakeGateway::with_account("alice", "secret");
    let (store, _) = store_with(&gateway);
    let count = Rc::new(Cell::new(0));
    let counter = Rc::clone(&count);
    let sub = store.subscribe(move |_| counter.set(counter.get() + 1));

    block_on(store.initialize());
    drop(sub);
    block_on(store.login("alice", "secret")).unwrap();

    assert_eq!(count.get(), 1);
}

#[test]
fn subscriber_may_read_store_reentrantly() {
    let gateway = FakeGateway::with_account("alice", "secret");
    let (store, _) = store_with(&gateway);
    let observed = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&observed);
    let reader = store.clone();
    let _sub = store.subscribe(move |_| *sink.borrow_mut() = reader.current_user());

    block_on(store.login("alice", "secret")).unwrap();

    assert_eq!(*observed.borrow(), Some(session("alice")));
}
