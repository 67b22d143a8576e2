//! # FoodFlow - theme and app configuration core
//!
//! `foodflow` holds the stateful parts of the FoodFlow food-ordering Mini App
//! that are not layout: the theme preference state machine, the host platform
//! context, the route table and the API settings.
//!
//! ## Themes
//!
//! A user picks a [`ThemeMode`]: light, dark, follow the system, or use the
//! Mini-App platform's own colors. The [`ThemeContext`] combines that choice
//! with the host's [`AmbientScheme`] into a [`ResolvedTheme`], applies it to a
//! [`ThemeTarget`] (normally the document root) and publishes it to
//! subscribers.
//!
//! ```rust
//! use foodflow::{AmbientScheme, ManualScheme, ResolvedTheme, ThemeContext, ThemeMode};
//!
//! let ambient = ManualScheme::new(AmbientScheme::Light);
//! let theme = ThemeContext::builder().scheme(ambient.clone()).build();
//! assert_eq!(theme.mode(), ThemeMode::System);
//!
//! ambient.set_scheme(AmbientScheme::Dark);
//! assert_eq!(theme.resolved(), ResolvedTheme::Dark);
//! ```
//!
//! Nothing in the theme path fails outward. An unreadable store falls back to
//! [`ThemeMode::System`], a failed write is logged through `tracing`, and a
//! host without a light/dark query ([`UnsupportedScheme`]) reads as light.
//!
//! ## Threading
//!
//! Everything here is single-threaded (`Rc`, `RefCell`). The context lives on
//! the UI thread and is driven by discrete events.

pub mod config;
pub mod error;
pub mod platform;
pub mod routes;
pub mod subscription;
pub mod theme;

pub use config::{api_config, ApiConfig};
pub use error::{ParseModeError, PlatformError, StoreError};
pub use platform::{PlatformHost, ThemeParams, WebAppContext};
pub use routes::AppRoute;
pub use subscription::{Listeners, Subscription};
pub use theme::{
    resolve, AmbientScheme, FileStore, KeyValueStore, ManualScheme, MemoryStore, OsScheme,
    PlatformScheme, PreferenceStore, ResolvedTheme, RootElement, SchemeDetector, SchemeSource,
    ThemeConfig, ThemeContext, ThemeContextBuilder, ThemeMode, ThemeTarget, UnsupportedScheme,
    DEFAULT_STORAGE_KEY, THEME_ATTRIBUTE,
};
