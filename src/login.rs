use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::DashboardError;
use crate::wishlist::Wishlist;

/// Static username → password mapping
///
/// Passwords are compared verbatim. The mapping is injected through the
/// application configuration so tests can substitute their own accounts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials {
    users: HashMap<String, String>,
}

impl Credentials {
    pub fn new(users: HashMap<String, String>) -> Self {
        Credentials { users }
    }

    /// Exact match of both username and password
    pub fn check_credentials(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|expected| expected == password)
    }

    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }
}

/// Accounts available when nothing else is configured
pub const DEFAULT_USERS: [(&str, &str); 2] = [("admin", "admin123"), ("user", "user123")];

pub(crate) fn default_users() -> HashMap<String, String> {
    DEFAULT_USERS
        .iter()
        .map(|(u, p)| (u.to_string(), p.to_string()))
        .collect()
}

impl Default for Credentials {
    fn default() -> Self {
        Credentials::new(default_users())
    }
}

/// Login form submission
///
/// The camera toggle and the captured photo are part of the login form but
/// play no role in authentication.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,

    /// Present when the "Enable Camera" box was ticked
    #[serde(default)]
    pub enable_camera: Option<String>,

    /// Captured picture as a data URL, if one was taken
    #[serde(default)]
    pub photo: Option<String>,
}

impl LoginForm {
    pub fn camera_enabled(&self) -> bool {
        self.enable_camera.is_some()
    }

    pub fn has_photo(&self) -> bool {
        self.camera_enabled() && self.photo.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Authentication state of a session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum AuthState {
    #[default]
    LoggedOut,
    LoggedIn { username: String },
}

/// Per-session state: login flag and wishlist
#[derive(Clone, Debug, Default)]
pub struct Session {
    state: AuthState,
    wishlist: Wishlist,
}

impl Session {
    /// A fresh session: logged out, empty wishlist
    pub fn new() -> Self {
        Session::default()
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, AuthState::LoggedIn { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            AuthState::LoggedIn { username } => Some(username),
            AuthState::LoggedOut => None,
        }
    }

    /// Attempts the LoggedOut → LoggedIn transition
    ///
    /// # Errors
    /// * `DashboardError::AuthFailure` if the credentials do not match; the
    ///   session is left unchanged and the caller may retry.
    pub fn login(
        &mut self,
        credentials: &Credentials,
        username: &str,
        password: &str,
    ) -> Result<(), DashboardError> {
        if !credentials.check_credentials(username, password) {
            return Err(DashboardError::AuthFailure);
        }
        self.state = AuthState::LoggedIn {
            username: username.to_string(),
        };
        Ok(())
    }

    /// Ends the session; the wishlist goes with it
    pub fn logout(&mut self) {
        self.state = AuthState::LoggedOut;
        self.wishlist = Wishlist::new();
    }

    pub fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    pub fn wishlist_mut(&mut self) -> &mut Wishlist {
        &mut self.wishlist
    }
}
