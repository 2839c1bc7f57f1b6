use super::*;

#[test]
fn paths_resolve_back_to_their_route() {
    for route in [
        AppRoute::Login,
        AppRoute::Register,
        AppRoute::Dashboard,
        AppRoute::Profile,
        AppRoute::Companies,
        AppRoute::Xmls,
    ] {
        assert_eq!(AppRoute::from_path(route.path()), Some(route));
    }
}

#[test]
fn from_path_ignores_trailing_slash() {
    assert_eq!(AppRoute::from_path("/login/"), Some(AppRoute::Login));
    assert_eq!(AppRoute::from_path("/profile/"), Some(AppRoute::Profile));
}

#[test]
fn from_path_unknown_is_none() {
    assert_eq!(AppRoute::from_path("/invoices"), None);
    assert_eq!(AppRoute::from_path("/login/extra"), None);
}

#[test]
fn auth_entry_points_are_public() {
    assert!(!AppRoute::Login.is_protected());
    assert!(!AppRoute::Register.is_protected());
}

#[test]
fn console_views_are_protected() {
    assert!(AppRoute::Dashboard.is_protected());
    assert!(AppRoute::Profile.is_protected());
    assert!(AppRoute::Companies.is_protected());
    assert!(AppRoute::Xmls.is_protected());
}

#[test]
fn landing_is_dashboard() {
    assert_eq!(AppRoute::LANDING, AppRoute::Dashboard);
}

#[test]
fn unknown_paths_are_not_protected() {
    assert!(!AppRoute::path_is_protected("/nope"));
    assert!(AppRoute::path_is_protected("/"));
    assert!(!AppRoute::path_is_protected("/register"));
    assert!(AppRoute::path_is_protected("/xmls/"));
}
