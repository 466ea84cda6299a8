//! Navigation seam between the data layer and whatever renders the app.
//!
//! The HTTP adapter is the only component that navigates on its own (to the
//! login page when the backend rejects the session). Everything else returns
//! data and lets the caller decide where to go.

use bazaar_core::Role;
use tokio::sync::watch;
use tracing::info;

/// Application routes the data layer knows about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Signup,
    VendorDashboard,
    AdminDashboard,
    /// Public store page by slug.
    Store(String),
}

impl Route {
    /// Path of the route in the web app.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Login => "/login".to_string(),
            Self::Signup => "/signup".to_string(),
            Self::VendorDashboard => "/vendor/dashboard".to_string(),
            Self::AdminDashboard => "/admin/dashboard".to_string(),
            Self::Store(slug) => format!("/store/{}", urlencoding::encode(slug)),
        }
    }

    /// Where a freshly signed-in account lands.
    #[must_use]
    pub const fn after_login(role: Role) -> Self {
        match role {
            Role::Admin => Self::AdminDashboard,
            Role::Vendor => Self::VendorDashboard,
        }
    }
}

/// Something that can move the app to another route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that records the latest route and publishes it to
/// subscribers. Front ends watch it and perform the actual transition.
#[derive(Debug)]
pub struct RecordingNavigator {
    current: watch::Sender<Option<Route>>,
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: watch::Sender::new(None),
        }
    }

    /// The most recent route, if any navigation happened.
    #[must_use]
    pub fn current(&self) -> Option<Route> {
        self.current.borrow().clone()
    }

    /// Receive every navigation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Route>> {
        self.current.subscribe()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        info!(path = %route.path(), "Navigating");
        self.current.send_replace(Some(route));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(Route::Login.path(), "/login");
        assert_eq!(Route::Store("mama put".to_string()).path(), "/store/mama%20put");
    }

    #[test]
    fn test_after_login() {
        assert_eq!(Route::after_login(Role::Admin), Route::AdminDashboard);
        assert_eq!(Route::after_login(Role::Vendor), Route::VendorDashboard);
    }

    #[test]
    fn test_recording_navigator() {
        let nav = RecordingNavigator::new();
        assert!(nav.current().is_none());
        nav.navigate(Route::Login);
        assert_eq!(nav.current(), Some(Route::Login));
    }
}
