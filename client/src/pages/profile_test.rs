use super::*;

fn form(username: &str, current: &str, new: &str, confirm: &str) -> ProfileForm {
    ProfileForm {
        username: username.to_owned(),
        current_password: current.to_owned(),
        new_password: new.to_owned(),
        confirm_password: confirm.to_owned(),
    }
}

#[test]
fn rename_only() {
    let update = validate_profile_form("alice", &form(" alicia ", "", "", "")).unwrap();
    assert_eq!(update, ProfileUpdate { username: Some("alicia".to_owned()), password: None });
}

#[test]
fn password_change_carries_current_password() {
    let update = validate_profile_form("alice", &form("alice", "old", "new", "new")).unwrap();
    assert_eq!(update.username, None);
    assert_eq!(update.password, Some(PasswordChange { current: "old".to_owned(), new: "new".to_owned() }));
}

#[test]
fn mismatched_confirmation_is_rejected() {
    assert_eq!(validate_profile_form("alice", &form("alice", "old", "new", "other")), Err("Passwords do not match."));
    assert_eq!(validate_profile_form("alice", &form("alice", "old", "", "stray")), Err("Passwords do not match."));
}

#[test]
fn password_change_requires_current_password() {
    assert_eq!(
        validate_profile_form("alice", &form("alice", "", "new", "new")),
        Err("Enter your current password to change it.")
    );
}

#[test]
fn empty_username_is_rejected() {
    assert_eq!(validate_profile_form("alice", &form("  ", "", "", "")), Err("Username cannot be empty."));
}

#[test]
fn unchanged_form_is_rejected() {
    assert_eq!(validate_profile_form("alice", &form("alice", "old", "", "")), Err("Nothing to change."));
}
