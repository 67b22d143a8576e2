//! Theme preference, ambient scheme and resolution.
//!
//! This module provides:
//!
//! - [`ThemeMode`], [`AmbientScheme`], [`ResolvedTheme`] and the pure [`resolve`]
//! - [`PreferenceStore`]: soft-failing persistence over a [`KeyValueStore`]
//! - [`SchemeSource`]: the host's light/dark preference and its changes
//! - [`ThemeTarget`]: where the resolved theme is applied
//! - [`ThemeContext`]: the state machine tying them together

mod context;
mod mode;
mod scheme;
mod store;
mod target;

pub use context::{ThemeConfig, ThemeContext, ThemeContextBuilder, DEFAULT_STORAGE_KEY};
pub use mode::{resolve, AmbientScheme, ResolvedTheme, ThemeMode};
pub use scheme::{
    ManualScheme, OsScheme, PlatformScheme, SchemeDetector, SchemeSource, UnsupportedScheme,
};
pub use store::{FileStore, KeyValueStore, MemoryStore, PreferenceStore};
pub use target::{RootElement, ThemeTarget, THEME_ATTRIBUTE};
