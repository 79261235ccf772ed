use nix::unistd::{User, getuid};

/// Login name of the current user: the passwd entry for the real uid, then
/// `$USER`, then an empty string.
pub fn current_login() -> String {
    match User::from_uid(getuid()) {
        Ok(Some(user)) => user.name,
        Ok(None) | Err(_) => std::env::var("USER").unwrap_or_default(),
    }
}
