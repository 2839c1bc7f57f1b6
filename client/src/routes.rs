//! Symbolic route table and the navigation boundary.
//!
//! DESIGN
//! ======
//! Session logic never builds URLs. It names an [`AppRoute`] and hands it to a
//! [`Navigator`]; the browser implementation maps that to the Leptos router.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

/// Every screen the console knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AppRoute {
    /// Login entry point.
    Login,
    /// Account registration entry point.
    Register,
    /// Authenticated landing view.
    Dashboard,
    /// Current user's profile.
    Profile,
    /// Company registry and certificates.
    Companies,
    /// Downloaded invoice XMLs.
    Xmls,
}

impl AppRoute {
    /// Where a freshly authenticated user lands.
    pub const LANDING: AppRoute = AppRoute::Dashboard;

    /// Router path for this route.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/",
            Self::Profile => "/profile",
            Self::Companies => "/companies",
            Self::Xmls => "/xmls",
        }
    }

    /// Resolve a location pathname. Trailing slashes are ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Self::Dashboard),
            "/login" => Some(Self::Login),
            "/register" => Some(Self::Register),
            "/profile" => Some(Self::Profile),
            "/companies" => Some(Self::Companies),
            "/xmls" => Some(Self::Xmls),
            _ => None,
        }
    }

    /// Whether rendering this route requires a live session.
    #[must_use]
    pub fn is_protected(self) -> bool {
        !matches!(self, Self::Login | Self::Register)
    }

    /// Protected-route check for a raw pathname. Unknown paths are public.
    #[must_use]
    pub fn path_is_protected(path: &str) -> bool {
        Self::from_path(path).is_some_and(Self::is_protected)
    }
}

/// Side-effecting navigation boundary consumed by the session store.
pub trait Navigator {
    fn navigate_to(&self, route: AppRoute);
}
