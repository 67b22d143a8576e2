//! The app's page routes.

use serde::{Deserialize, Serialize};

/// A page of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRoute {
    Home,
    Favorites,
    Profile,
    /// Catch-all for unknown paths.
    NotFound,
}

impl AppRoute {
    pub const ALL: [AppRoute; 4] = [
        AppRoute::Home,
        AppRoute::Favorites,
        AppRoute::Profile,
        AppRoute::NotFound,
    ];

    /// The path pattern this route is registered under.
    pub fn path(self) -> &'static str {
        match self {
            AppRoute::Home => "/",
            AppRoute::Favorites => "/favorites",
            AppRoute::Profile => "/profile",
            AppRoute::NotFound => "*",
        }
    }

    /// Finds the route for a concrete path. A trailing slash is ignored.
    pub fn from_path(path: &str) -> AppRoute {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        AppRoute::ALL
            .into_iter()
            .filter(|route| *route != AppRoute::NotFound)
            .find(|route| route.path() == normalized)
            .unwrap_or(AppRoute::NotFound)
    }
}
